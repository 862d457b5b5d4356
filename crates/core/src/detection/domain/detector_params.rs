use thiserror::Error;

use crate::shared::constants::{
    DEFAULT_MIN_FACE_SIZE, DEFAULT_MIN_NEIGHBORS, DEFAULT_SCALE_FACTOR,
};

#[derive(Error, Debug, PartialEq)]
pub enum DetectorParamsError {
    #[error("scale factor must be greater than 1.0, got {0}")]
    ScaleFactor(f64),
    #[error("minimum face size must be at least 1 pixel, got {0}")]
    MinFaceSize(u32),
}

/// Tunables of the multi-scale sliding-window detector.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DetectorParams {
    /// Growth of the search window between pyramid levels.
    pub scale_factor: f64,
    /// Overlapping raw hits a cluster needs to count as a face.
    pub min_neighbors: u32,
    /// Candidates smaller than `min_face_size × min_face_size` are skipped.
    pub min_face_size: u32,
}

impl DetectorParams {
    pub fn new(
        scale_factor: f64,
        min_neighbors: u32,
        min_face_size: u32,
    ) -> Result<Self, DetectorParamsError> {
        if !scale_factor.is_finite() || scale_factor <= 1.0 {
            return Err(DetectorParamsError::ScaleFactor(scale_factor));
        }
        if min_face_size == 0 {
            return Err(DetectorParamsError::MinFaceSize(min_face_size));
        }
        Ok(Self {
            scale_factor,
            min_neighbors,
            min_face_size,
        })
    }
}

impl Default for DetectorParams {
    fn default() -> Self {
        Self {
            scale_factor: DEFAULT_SCALE_FACTOR,
            min_neighbors: DEFAULT_MIN_NEIGHBORS,
            min_face_size: DEFAULT_MIN_FACE_SIZE,
        }
    }
}
