use thiserror::Error;

/// Faults raised inside a prediction backend.
///
/// All of these are server-side problems; none is caused by the caller's
/// payload.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("failed to load emotion model: {0}")]
    ModelLoad(String),
    #[error("emotion model produced {actual} scores, expected {expected}")]
    ShapeMismatch { expected: usize, actual: usize },
    #[error("inference failed: {0}")]
    Inference(String),
    #[error("face analyzer failed: {0}")]
    Analyzer(String),
    #[error("{0} backend is not configured")]
    NotConfigured(&'static str),
}
