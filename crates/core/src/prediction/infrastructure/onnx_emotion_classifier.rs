/// Local emotion classifier backed by an ONNX Runtime session.
///
/// Expects the 48×48 grayscale CNN exported to ONNX with an NHWC input of
/// shape `[1, 48, 48, 1]` and a 7-way softmax output in label order.
use std::fmt::Display;
use std::path::Path;
use std::sync::Mutex;

use crate::normalization::normalizer::NormalizedTensor;
use crate::prediction::domain::backend_error::BackendError;
use crate::prediction::domain::emotion_classifier::EmotionClassifier;
use crate::prediction::domain::emotion_label::EmotionLabel;
use crate::prediction::infrastructure::onnx_session;
use crate::shared::constants::FACE_INPUT_SIZE;

pub struct OnnxEmotionClassifier {
    session: Mutex<ort::session::Session>,
}

impl OnnxEmotionClassifier {
    /// Load the model and verify it with a warm-up pass.
    ///
    /// Any failure here is a startup fault: a classifier that loads
    /// successfully never reports shape problems per request.
    pub fn new(model_path: &Path) -> Result<Self, BackendError> {
        if !model_path.exists() {
            return Err(BackendError::ModelLoad(format!(
                "model file not found at {}",
                model_path.display()
            )));
        }
        let session = onnx_session::build_session(model_path)
            .map_err(|e| BackendError::ModelLoad(e.to_string()))?;
        check_input_dims(onnx_session::input_dims(&session))?;

        let classifier = Self {
            session: Mutex::new(session),
        };
        let scores = classifier.classify(&NormalizedTensor::zeros())?;
        if scores.len() != EmotionLabel::ALL.len() {
            return Err(BackendError::ShapeMismatch {
                expected: EmotionLabel::ALL.len(),
                actual: scores.len(),
            });
        }
        log::info!("Loaded emotion model {}", model_path.display());
        Ok(classifier)
    }
}

impl EmotionClassifier for OnnxEmotionClassifier {
    fn classify(&self, face: &NormalizedTensor) -> Result<Vec<f32>, BackendError> {
        let input_value =
            ort::value::Tensor::from_array(face.as_array().clone()).map_err(inference_error)?;
        let mut session = self
            .session
            .lock()
            .map_err(|e| BackendError::Inference(format!("Lock poisoned: {e}")))?;
        let outputs = session
            .run(ort::inputs![input_value])
            .map_err(inference_error)?;
        let scores = outputs[0]
            .try_extract_array::<f32>()
            .map_err(inference_error)?;
        Ok(scores.iter().copied().collect())
    }
}

fn inference_error(e: impl Display) -> BackendError {
    BackendError::Inference(e.to_string())
}

/// Reject models whose declared input cannot take a `[1, 48, 48, 1]` tensor.
/// Symbolic dimensions are accepted.
fn check_input_dims(dims: Option<Vec<Option<usize>>>) -> Result<(), BackendError> {
    let Some(dims) = dims else {
        return Ok(());
    };
    let expected = [1, FACE_INPUT_SIZE, FACE_INPUT_SIZE, 1];
    let compatible = dims.len() == expected.len()
        && dims
            .iter()
            .zip(expected)
            .all(|(d, e)| d.map_or(true, |d| d == e));
    if compatible {
        Ok(())
    } else {
        let shown: Vec<String> = dims
            .iter()
            .map(|d| d.map_or("?".to_string(), |d| d.to_string()))
            .collect();
        Err(BackendError::ModelLoad(format!(
            "model input [{}] is not compatible with [1, 48, 48, 1]",
            shown.join(", ")
        )))
    }
}
