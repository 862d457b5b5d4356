use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::detection::domain::detector_params::DetectorParams;
use crate::detection::infrastructure::haar_face_localizer::HaarFaceLocalizer;
use crate::pipeline::predict_emotion_use_case::PredictEmotionUseCase;
use crate::prediction::domain::face_analyzer::FaceAnalyzer;
use crate::prediction::infrastructure::deepface_analyzer::DeepFaceAnalyzer;
use crate::prediction::infrastructure::onnx_emotion_classifier::OnnxEmotionClassifier;
use crate::shared::constants::{HAAR_CASCADE_NAME, HAAR_CASCADE_URL};
use crate::shared::model_resolver::{self, ProgressFn};

/// Everything needed to stand up the prediction pipeline.
#[derive(Clone, Debug)]
pub struct PredictorSettings {
    pub emotion_model: PathBuf,
    /// Explicit cascade file; resolved by name when absent.
    pub cascade: Option<PathBuf>,
    pub detector: DetectorParams,
    /// Base URL of the DeepFace service; the external backend is disabled
    /// without it.
    pub deepface_url: Option<String>,
    pub analyzer_timeout: Duration,
}

/// Load every model the pipeline needs, once.
///
/// A cascade that is not given explicitly is looked up in the user cache,
/// then next to the emotion model, then downloaded.
pub fn create_predictor(
    settings: &PredictorSettings,
    progress: Option<ProgressFn>,
) -> Result<PredictEmotionUseCase, Box<dyn std::error::Error>> {
    let cascade_path = match &settings.cascade {
        Some(path) => path.clone(),
        None => {
            log::info!("Resolving model: {HAAR_CASCADE_NAME}");
            model_resolver::resolve(
                HAAR_CASCADE_NAME,
                HAAR_CASCADE_URL,
                settings
                    .emotion_model
                    .parent()
                    .filter(|p| !p.as_os_str().is_empty()),
                progress,
            )?
        }
    };
    create_predictor_with_cascade(settings, &cascade_path)
}

fn create_predictor_with_cascade(
    settings: &PredictorSettings,
    cascade_path: &Path,
) -> Result<PredictEmotionUseCase, Box<dyn std::error::Error>> {
    let localizer = HaarFaceLocalizer::from_file(cascade_path, settings.detector)?;
    log::info!(
        "Detector: scale_factor={}, min_neighbors={}, min_face_size={}",
        settings.detector.scale_factor,
        settings.detector.min_neighbors,
        settings.detector.min_face_size
    );

    let classifier = OnnxEmotionClassifier::new(&settings.emotion_model)?;

    let analyzer: Option<Arc<dyn FaceAnalyzer>> = match &settings.deepface_url {
        Some(url) => {
            let analyzer = DeepFaceAnalyzer::new(url, settings.analyzer_timeout)?;
            log::info!("DeepFace analyzer endpoint: {}", analyzer.endpoint());
            Some(Arc::new(analyzer))
        }
        None => {
            log::info!("No DeepFace service configured, external backend disabled");
            None
        }
    };

    Ok(PredictEmotionUseCase::new(
        Arc::new(localizer),
        Arc::new(classifier),
        analyzer,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::infrastructure::haar_cascade::test_cascades::BRIGHT_BOTTOM;

    fn settings(dir: &Path) -> PredictorSettings {
        PredictorSettings {
            emotion_model: dir.join("model.onnx"),
            cascade: None,
            detector: DetectorParams::default(),
            deepface_url: None,
            analyzer_timeout: Duration::from_secs(1),
        }
    }

    #[test]
    fn test_missing_cascade_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = create_predictor_with_cascade(&settings(dir.path()), &dir.path().join("x.xml"))
            .err()
            .unwrap();
        assert!(err.to_string().contains("cascade"), "{err}");
    }

    #[test]
    fn test_missing_emotion_model_fails_after_cascade_loads() {
        let dir = tempfile::tempdir().unwrap();
        let cascade = dir.path().join("cascade.xml");
        std::fs::write(&cascade, BRIGHT_BOTTOM).unwrap();

        let err = create_predictor_with_cascade(&settings(dir.path()), &cascade)
            .err()
            .unwrap();
        assert!(err.to_string().contains("model file not found"), "{err}");
    }
}
