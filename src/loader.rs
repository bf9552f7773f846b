//! Image loading - decodes image files into raw RGBA buffers.
//!
//! Decoding runs on a background thread per request. Each completion carries
//! the [`LoadTicket`] it was requested with, so the session can drop results
//! from superseded requests.

use image::RgbaImage;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::Duration;

use crate::cache::ImageId;
use crate::session::LoadTicket;

/// Decoded image ready to hand to a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    /// RGBA bytes, row-major
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub source_id: ImageId,
}

impl DecodedImage {
    pub fn from_rgba_image(image: RgbaImage, source_id: ImageId) -> Self {
        let (width, height) = image.dimensions();
        Self {
            bytes: image.into_raw(),
            width,
            height,
            source_id,
        }
    }

    /// Copy back into an `RgbaImage`. `None` if the buffer does not match
    /// the dimensions.
    pub fn to_rgba_image(&self) -> Option<RgbaImage> {
        RgbaImage::from_raw(self.width, self.height, self.bytes.clone())
    }
}

/// Errors that can occur while loading an image.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("Failed to read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to decode '{path}': {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Timed out waiting for image after {0:?}")]
    Timeout(Duration),

    #[error("Decoder for '{0}' panicked")]
    Panicked(PathBuf),

    #[error("Loader thread exited without a result")]
    Disconnected,
}

/// Read and decode an image file synchronously.
///
/// The image id is a hash of the decoded pixels.
pub fn decode_file(path: &Path) -> Result<DecodedImage, LoadError> {
    let data = std::fs::read(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let image = image::load_from_memory(&data).map_err(|source| LoadError::Decode {
        path: path.to_path_buf(),
        source,
    })?;
    let image = image.to_rgba8();
    let id = ImageId::from_content(image.as_raw());
    log::debug!(
        "Decoded {} ({}x{}) as {}",
        path.display(),
        image.width(),
        image.height(),
        id
    );
    Ok(DecodedImage::from_rgba_image(image, id))
}

/// A finished load request.
#[derive(Debug)]
pub struct LoadCompletion {
    pub ticket: LoadTicket,
    pub result: Result<DecodedImage, LoadError>,
}

/// Decodes files in the background and delivers completions over a channel.
pub struct ImageLoader {
    tx: Sender<LoadCompletion>,
    rx: Receiver<LoadCompletion>,
}

impl Default for ImageLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageLoader {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        Self { tx, rx }
    }

    /// Start decoding `path` for `ticket`. Exactly one completion is sent,
    /// even if the decoder panics.
    pub fn request(&self, ticket: LoadTicket, path: PathBuf) {
        self.spawn_decode(ticket, path, decode_file);
    }

    fn spawn_decode<F>(&self, ticket: LoadTicket, path: PathBuf, decode: F)
    where
        F: FnOnce(&Path) -> Result<DecodedImage, LoadError> + Send + 'static,
    {
        let tx = self.tx.clone();
        thread::spawn(move || {
            let result = panic::catch_unwind(AssertUnwindSafe(|| decode(&path)))
                .unwrap_or_else(|_| {
                    log::error!("Decoder panicked on {}", path.display());
                    Err(LoadError::Panicked(path.clone()))
                });
            // Receiver gone means nobody is waiting any more
            let _ = tx.send(LoadCompletion { ticket, result });
        });
    }

    /// Next completion, if one is ready.
    pub fn try_recv(&self) -> Option<LoadCompletion> {
        self.rx.try_recv().ok()
    }

    /// Wait up to `timeout` for the next completion.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<LoadCompletion, LoadError> {
        self.rx.recv_timeout(timeout).map_err(|e| match e {
            RecvTimeoutError::Timeout => LoadError::Timeout(timeout),
            RecvTimeoutError::Disconnected => LoadError::Disconnected,
        })
    }
}
