use std::sync::Arc;
use std::time::Instant;

use crate::decoding::image_decoder;
use crate::detection::domain::face_localizer::FaceLocalizer;
use crate::normalization::normalizer::Normalizer;
use crate::pipeline::pipeline_error::PipelineError;
use crate::prediction::domain::backend_error::BackendError;
use crate::prediction::domain::backend_kind::BackendKind;
use crate::prediction::domain::emotion_classifier::EmotionClassifier;
use crate::prediction::domain::face_analyzer::FaceAnalyzer;
use crate::prediction::domain::prediction_result::{aggregate, PredictionResult, RawPrediction};
use crate::shared::decoded_image::DecodedImage;

/// Single-image emotion pipeline.
///
/// Local path: decode → locate → normalize → classify → aggregate.
/// External path: decode → analyze → aggregate.
///
/// Holds only read-only collaborators, so one instance serves every
/// request concurrently.
pub struct PredictEmotionUseCase {
    localizer: Arc<dyn FaceLocalizer>,
    normalizer: Normalizer,
    classifier: Arc<dyn EmotionClassifier>,
    analyzer: Option<Arc<dyn FaceAnalyzer>>,
}

impl PredictEmotionUseCase {
    pub fn new(
        localizer: Arc<dyn FaceLocalizer>,
        classifier: Arc<dyn EmotionClassifier>,
        analyzer: Option<Arc<dyn FaceAnalyzer>>,
    ) -> Self {
        Self {
            localizer,
            normalizer: Normalizer::new(),
            classifier,
            analyzer,
        }
    }

    /// Run the pipeline on an encoded image with the requested backend.
    pub fn execute(
        &self,
        payload: &str,
        backend: BackendKind,
    ) -> Result<PredictionResult, PipelineError> {
        let started = Instant::now();
        let image = image_decoder::decode(payload)?;
        log::debug!(
            "Decoded {}x{} image in {:?}",
            image.width(),
            image.height(),
            started.elapsed()
        );

        let raw = match backend {
            BackendKind::LocalClassifier => self.classify_locally(&image)?,
            BackendKind::ExternalAnalyzer => self.analyze_externally(&image)?,
        };

        log::debug!(
            "Predicted '{}' ({:?}) over {} labels with {} backend in {:?}",
            raw.dominant,
            raw.distribution.get(&raw.dominant),
            raw.distribution.len(),
            backend,
            started.elapsed()
        );
        Ok(aggregate(raw))
    }

    fn classify_locally(&self, image: &DecodedImage) -> Result<RawPrediction, PipelineError> {
        let started = Instant::now();
        let face = self
            .localizer
            .locate(image)
            .ok_or(PipelineError::NoFaceFound)?;
        log::debug!("Located face {face:?} in {:?}", started.elapsed());

        let tensor = self.normalizer.normalize(image, &face);
        let scores = self.classifier.classify(&tensor)?;
        Ok(RawPrediction::from_classifier_scores(&scores)?)
    }

    fn analyze_externally(&self, image: &DecodedImage) -> Result<RawPrediction, PipelineError> {
        let analyzer = self
            .analyzer
            .as_ref()
            .ok_or(BackendError::NotConfigured("deepface"))?;
        Ok(analyzer.analyze(image)?)
    }
}
