use crate::shared::decoded_image::DecodedImage;

use super::backend_error::BackendError;
use super::prediction_result::RawPrediction;

/// Domain interface for the external analyzer backend.
///
/// Receives the whole decoded image and does its own face detection, so it
/// may pick a different face than the local localizer.
pub trait FaceAnalyzer: Send + Sync {
    fn analyze(&self, image: &DecodedImage) -> Result<RawPrediction, BackendError>;
}
