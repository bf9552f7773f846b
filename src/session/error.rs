//! Session error types

use crate::loader::LoadError;
use crate::pixels::{InvalidBlockSize, MalformedBufferError};

/// Errors from session operations. None of them change session state.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("No image loaded")]
    NoImage,

    #[error("Malformed pixel buffer: {0}")]
    Malformed(#[from] MalformedBufferError),

    #[error("Image load failed: {0}")]
    LoadFailed(#[from] LoadError),

    #[error(transparent)]
    InvalidBlockSize(#[from] InvalidBlockSize),
}
