use crate::normalization::normalizer::NormalizedTensor;

use super::backend_error::BackendError;

/// Domain interface for the local classifier backend.
///
/// Implementations run one forward pass over a normalized face and return
/// one score per canonical label, in `EmotionLabel::ALL` order. Called
/// concurrently from request threads, so implementations serialize access
/// to any runtime that is not reentrant.
pub trait EmotionClassifier: Send + Sync {
    fn classify(&self, face: &NormalizedTensor) -> Result<Vec<f32>, BackendError>;
}
