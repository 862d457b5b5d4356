use thiserror::Error;

use crate::decoding::image_decoder::DecodeError;
use crate::prediction::domain::backend_error::BackendError;
use crate::prediction::domain::backend_kind::UnknownBackend;

/// Every way a prediction request can end without a result.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("No image data provided")]
    MissingImage,
    #[error(transparent)]
    UnknownBackend(#[from] UnknownBackend),
    #[error("Invalid image data: {0}")]
    Decode(#[from] DecodeError),
    #[error("No face detected")]
    NoFaceFound,
    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl PipelineError {
    /// Whether the request itself was at fault (400) rather than the
    /// service (500).
    pub fn is_client_error(&self) -> bool {
        !matches!(self, PipelineError::Backend(_))
    }
}
