use std::path::PathBuf;
use std::process;
use std::time::Duration;

use base64::Engine;
use clap::Parser;

use emosense_core::detection::domain::detector_params::DetectorParams;
use emosense_core::pipeline::predictor_factory::{create_predictor, PredictorSettings};
use emosense_core::prediction::domain::backend_kind::BackendKind;
use emosense_core::shared::constants::{
    DEFAULT_ANALYZER_TIMEOUT_SECS, DEFAULT_EMOTION_MODEL_PATH, DEFAULT_MIN_FACE_SIZE,
    DEFAULT_MIN_NEIGHBORS, DEFAULT_SCALE_FACTOR,
};

/// Predict the facial emotion in a single image.
#[derive(Parser, Debug)]
#[command(name = "emosense")]
struct Cli {
    /// Input image file (PNG or JPEG).
    input: PathBuf,

    /// Prediction backend: tensorflow (local classifier) or deepface.
    #[arg(long, default_value = "tensorflow")]
    model: String,

    /// ONNX emotion classifier.
    #[arg(long, env = "EMOTION_MODEL_PATH", default_value = DEFAULT_EMOTION_MODEL_PATH)]
    emotion_model: PathBuf,

    /// Haar cascade XML; resolved automatically if omitted.
    #[arg(long, env = "HAAR_CASCADE_PATH")]
    cascade: Option<PathBuf>,

    /// Detector pyramid scale step (> 1.0).
    #[arg(long, default_value_t = DEFAULT_SCALE_FACTOR)]
    scale_factor: f64,

    /// Neighbouring detections a face needs to be kept.
    #[arg(long, default_value_t = DEFAULT_MIN_NEIGHBORS)]
    min_neighbors: u32,

    /// Smallest face side in pixels.
    #[arg(long, default_value_t = DEFAULT_MIN_FACE_SIZE)]
    min_face_size: u32,

    /// Base URL of a DeepFace analysis service.
    #[arg(long, env = "DEEPFACE_URL")]
    deepface_url: Option<String>,

    /// Deadline for one DeepFace analysis call.
    #[arg(long, default_value_t = DEFAULT_ANALYZER_TIMEOUT_SECS)]
    analyzer_timeout_secs: u64,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let backend: BackendKind = cli.model.parse()?;
    let settings = settings(&cli)?;

    if !cli.input.exists() {
        return Err(format!("Input file not found: {}", cli.input.display()).into());
    }
    let bytes = std::fs::read(&cli.input)?;
    let payload = base64::engine::general_purpose::STANDARD.encode(bytes);

    let predictor = create_predictor(&settings, Some(Box::new(download_progress)))?;
    log::info!("Predicting {} with {backend} backend", cli.input.display());
    let result = predictor.execute(&payload, backend)?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

fn settings(cli: &Cli) -> Result<PredictorSettings, Box<dyn std::error::Error>> {
    Ok(PredictorSettings {
        emotion_model: cli.emotion_model.clone(),
        cascade: cli.cascade.clone(),
        detector: DetectorParams::new(cli.scale_factor, cli.min_neighbors, cli.min_face_size)?,
        deepface_url: cli.deepface_url.clone(),
        analyzer_timeout: Duration::from_secs(cli.analyzer_timeout_secs),
    })
}

fn download_progress(downloaded: u64, total: u64) {
    if total > 0 {
        let pct = (downloaded as f64 / total as f64 * 100.0) as u32;
        eprint!("\rDownloading face detection cascade... {pct}%");
        if downloaded >= total {
            eprintln!();
        }
    } else {
        eprint!("\rDownloading face detection cascade... {downloaded} bytes");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        let mut argv = vec!["emosense"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_defaults_to_local_classifier() {
        let cli = parse(&["face.jpg"]);
        assert_eq!(cli.model.parse::<BackendKind>().unwrap(), BackendKind::LocalClassifier);
        assert_eq!(settings(&cli).unwrap().detector, DetectorParams::default());
    }

    #[test]
    fn test_detector_options() {
        let cli = parse(&["face.jpg", "--min-neighbors", "2", "--scale-factor", "1.3"]);
        let detector = settings(&cli).unwrap().detector;
        assert_eq!(detector.min_neighbors, 2);
        assert_eq!(detector.scale_factor, 1.3);
    }

    #[test]
    fn test_zero_min_face_size_rejected() {
        let cli = parse(&["face.jpg", "--min-face-size", "0"]);
        assert!(settings(&cli).is_err());
    }

    #[test]
    fn test_input_is_required() {
        assert!(Cli::try_parse_from(["emosense"]).is_err());
    }
}
