use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use emosense_core::detection::domain::detector_params::{DetectorParams, DetectorParamsError};
use emosense_core::pipeline::predictor_factory::PredictorSettings;
use emosense_core::shared::constants::{
    DEFAULT_ANALYZER_TIMEOUT_SECS, DEFAULT_EMOTION_MODEL_PATH, DEFAULT_MIN_FACE_SIZE,
    DEFAULT_MIN_NEIGHBORS, DEFAULT_SCALE_FACTOR,
};

pub const DEFAULT_CHAT_API_URL: &str = "https://openrouter.ai/api/v1/chat/completions";
pub const DEFAULT_CHAT_MODEL: &str = "meta-llama/llama-3-8b-instruct";

/// Emotion detection and chat relay HTTP service.
#[derive(Parser, Debug, Clone)]
#[command(name = "emosense-server")]
pub struct Config {
    /// Address to bind.
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on.
    #[arg(long, env = "PORT", default_value_t = 5000)]
    pub port: u16,

    /// ONNX emotion classifier (48x48 grayscale input, 7 outputs).
    #[arg(long, env = "EMOTION_MODEL_PATH", default_value = DEFAULT_EMOTION_MODEL_PATH)]
    pub emotion_model: PathBuf,

    /// Haar cascade XML; the frontal-face cascade is resolved automatically if omitted.
    #[arg(long, env = "HAAR_CASCADE_PATH")]
    pub cascade: Option<PathBuf>,

    /// Detector pyramid scale step (> 1.0).
    #[arg(long, default_value_t = DEFAULT_SCALE_FACTOR)]
    pub scale_factor: f64,

    /// Neighbouring detections a face needs to be kept.
    #[arg(long, default_value_t = DEFAULT_MIN_NEIGHBORS)]
    pub min_neighbors: u32,

    /// Smallest face side in pixels.
    #[arg(long, default_value_t = DEFAULT_MIN_FACE_SIZE)]
    pub min_face_size: u32,

    /// Base URL of a DeepFace analysis service (enables model "deepface").
    #[arg(long, env = "DEEPFACE_URL")]
    pub deepface_url: Option<String>,

    /// Deadline for one DeepFace analysis call.
    #[arg(long, default_value_t = DEFAULT_ANALYZER_TIMEOUT_SECS)]
    pub analyzer_timeout_secs: u64,

    /// Bearer credential for the chat completion API.
    #[arg(long, env = "OPENROUTER_API_KEY", hide_env_values = true)]
    pub openrouter_api_key: Option<String>,

    /// Chat completion endpoint.
    #[arg(long, default_value = DEFAULT_CHAT_API_URL)]
    pub chat_api_url: String,

    /// Model requested from the chat completion API.
    #[arg(long, default_value = DEFAULT_CHAT_MODEL)]
    pub chat_model: String,

    /// Largest accepted request body in bytes.
    #[arg(long, default_value_t = 16 * 1024 * 1024)]
    pub max_body_bytes: usize,
}

impl Config {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn predictor_settings(&self) -> Result<PredictorSettings, DetectorParamsError> {
        Ok(PredictorSettings {
            emotion_model: self.emotion_model.clone(),
            cascade: self.cascade.clone(),
            detector: DetectorParams::new(
                self.scale_factor,
                self.min_neighbors,
                self.min_face_size,
            )?,
            deepface_url: self.deepface_url.clone(),
            analyzer_timeout: Duration::from_secs(self.analyzer_timeout_secs),
        })
    }
}
