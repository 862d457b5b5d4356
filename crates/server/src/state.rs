use std::sync::Arc;

use emosense_core::pipeline::predict_emotion_use_case::PredictEmotionUseCase;

use crate::chat_relay::ChatRelay;

/// Process-wide, read-only service state shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub predictor: Arc<PredictEmotionUseCase>,
    pub chat: Arc<ChatRelay>,
}

impl AppState {
    pub fn new(predictor: PredictEmotionUseCase, chat: ChatRelay) -> Self {
        Self {
            predictor: Arc::new(predictor),
            chat: Arc::new(chat),
        }
    }
}
