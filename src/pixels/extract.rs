//! Flat RGBA buffer to pixel grid conversion.

use super::{Color, PixelGrid, BYTES_PER_PIXEL};

/// Byte buffer that cannot be split into whole RGBA rows.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MalformedBufferError {
    #[error("buffer length {len} is not a multiple of 4 (RGBA)")]
    NotRgba { len: usize },

    #[error("buffer of {len} bytes does not divide into rows of {width} pixels")]
    PartialRow { len: usize, width: u32 },

    #[error("width is zero but buffer holds {len} bytes")]
    ZeroWidth { len: usize },

    #[error("buffer of {len} bytes does not match {width}x{height}")]
    DimensionMismatch { width: u32, height: u32, len: usize },
}

/// Convert a flat RGBA byte sequence into a 2D grid of colors.
///
/// # Arguments
/// * `bytes` - RGBA data, 4 bytes per pixel, row-major
/// * `width` - Number of pixels per row
///
/// # Returns
/// A grid with `bytes.len() / (4 * width)` rows of `width` colors. An empty
/// buffer yields an empty grid.
///
/// # Errors
/// [`MalformedBufferError`] if the length is not a multiple of 4 or leaves a
/// trailing partial row.
pub fn extract(bytes: &[u8], width: u32) -> Result<PixelGrid, MalformedBufferError> {
    let len = bytes.len();
    if len % BYTES_PER_PIXEL != 0 {
        return Err(MalformedBufferError::NotRgba { len });
    }
    if len == 0 {
        return Ok(PixelGrid::default());
    }
    if width == 0 {
        return Err(MalformedBufferError::ZeroWidth { len });
    }

    let row_bytes = width as usize * BYTES_PER_PIXEL;
    if len % row_bytes != 0 {
        return Err(MalformedBufferError::PartialRow { len, width });
    }

    let rows = bytes
        .chunks_exact(row_bytes)
        .map(|row| {
            row.chunks_exact(BYTES_PER_PIXEL)
                .map(|px| Color::rgba(px[0], px[1], px[2], px[3]))
                .collect()
        })
        .collect();

    Ok(PixelGrid {
        rows,
        width: width as usize,
    })
}
