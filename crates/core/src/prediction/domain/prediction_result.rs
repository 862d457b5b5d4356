use serde::{Deserialize, Serialize};

use super::backend_error::BackendError;
use super::emotion_distribution::{argmax, EmotionDistribution};
use super::emotion_label::EmotionLabel;

/// What a backend hands back before packaging.
#[derive(Clone, Debug, PartialEq)]
pub struct RawPrediction {
    pub distribution: EmotionDistribution,
    pub dominant: String,
    pub confidence: Option<f64>,
}

impl RawPrediction {
    /// Interpret local classifier scores.
    ///
    /// The dominant label is the first maximum in label order; confidence is
    /// that maximum rounded to two decimals.
    pub fn from_classifier_scores(scores: &[f32]) -> Result<RawPrediction, BackendError> {
        let mismatch = || BackendError::ShapeMismatch {
            expected: EmotionLabel::ALL.len(),
            actual: scores.len(),
        };
        let distribution = EmotionDistribution::from_scores(scores).ok_or_else(mismatch)?;
        let index = argmax(scores).ok_or_else(mismatch)?;
        let best = EmotionLabel::from_index(index).ok_or_else(mismatch)?;
        Ok(RawPrediction {
            distribution,
            dominant: best.as_str().to_string(),
            confidence: Some(round2(scores[index] as f64)),
        })
    }
}

/// Uniform response shape shared by both backends.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub emotion: String,
    pub confidence: Option<f64>,
    pub all_predictions: EmotionDistribution,
}

/// Package a backend's output verbatim; labels and scale are not reconciled
/// across backends.
pub fn aggregate(raw: RawPrediction) -> PredictionResult {
    PredictionResult {
        emotion: raw.dominant,
        confidence: raw.confidence,
        all_predictions: raw.distribution,
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
