use axum::extract::rejection::JsonRejection;
use axum::extract::{DefaultBodyLimit, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;

use emosense_core::pipeline::pipeline_error::PipelineError;
use emosense_core::prediction::domain::backend_kind::BackendKind;
use emosense_core::prediction::domain::prediction_result::PredictionResult;

use crate::api_error::ApiError;
use crate::state::AppState;

pub const EMPTY_CHAT_REPLY: &str = "Please enter a message.";

#[derive(Debug, Deserialize)]
pub struct PredictRequest {
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub response: String,
}

pub fn router(state: AppState, max_body_bytes: usize) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/predict", post(predict))
        .route("/chat", post(chat))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn home() -> Json<Value> {
    Json(json!({ "message": "Emotion Detection & Chatbot API is running!" }))
}

async fn predict(
    State(state): State<AppState>,
    payload: Result<Json<PredictRequest>, JsonRejection>,
) -> Result<Json<PredictionResult>, ApiError> {
    let Json(request) = payload?;
    let image = request
        .image
        .filter(|s| !s.trim().is_empty())
        .ok_or(PipelineError::MissingImage)?;
    let backend = BackendKind::select(request.model.as_deref()).map_err(PipelineError::from)?;

    let predictor = state.predictor.clone();
    let result = tokio::task::spawn_blocking(move || predictor.execute(&image, backend))
        .await
        .map_err(|e| ApiError::internal(format!("prediction task failed: {e}")))??;

    log::info!(
        "Predicted '{}' ({}) with {} backend",
        result.emotion,
        result
            .confidence
            .map_or("no confidence".to_string(), |c| format!("{c:.2}")),
        backend
    );
    Ok(Json(result))
}

async fn chat(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, ApiError> {
    let Json(request) = payload?;
    let message = request.message.unwrap_or_default();
    let message = message.trim();
    if message.is_empty() {
        return Ok(Json(ChatResponse {
            response: EMPTY_CHAT_REPLY.to_string(),
        }));
    }

    let response = state.chat.reply(message).await?;
    Ok(Json(ChatResponse { response }))
}
