pub const HAAR_CASCADE_NAME: &str = "haarcascade_frontalface_default.xml";
pub const HAAR_CASCADE_URL: &str =
    "https://raw.githubusercontent.com/opencv/opencv/4.x/data/haarcascades/haarcascade_frontalface_default.xml";

pub const DEFAULT_EMOTION_MODEL_PATH: &str = "models/model.onnx";

/// Largest width or height accepted from an uploaded image.
pub const MAX_IMAGE_DIMENSION: u32 = 4096;

/// Side length of the square face crop fed to the local classifier.
pub const FACE_INPUT_SIZE: usize = 48;

pub const DEFAULT_SCALE_FACTOR: f64 = 1.1;
pub const DEFAULT_MIN_NEIGHBORS: u32 = 5;
pub const DEFAULT_MIN_FACE_SIZE: u32 = 30;

/// Relative tolerance used when clustering overlapping detector hits.
pub const GROUPING_EPS: f64 = 0.2;

pub const DEFAULT_ANALYZER_TIMEOUT_SECS: u64 = 60;
