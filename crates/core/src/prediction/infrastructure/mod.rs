pub mod deepface_analyzer;
pub mod onnx_emotion_classifier;
pub mod onnx_session;
