//! Pass-through to a remote chat completion API (OpenRouter-compatible).

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("chat relay is not configured: missing OPENROUTER_API_KEY")]
    MissingApiKey,
    #[error("chat request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("upstream error ({status}): {body}")]
    Upstream { status: u16, body: String },
    #[error("malformed upstream response: {0}")]
    MalformedResponse(String),
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ReplyMessage,
}

#[derive(Deserialize)]
struct ReplyMessage {
    content: String,
}

pub struct ChatRelay {
    http: reqwest::Client,
    api_url: String,
    model: String,
    api_key: Option<String>,
}

impl ChatRelay {
    pub fn new(api_url: impl Into<String>, model: impl Into<String>, api_key: Option<String>) -> Self {
        let api_key = api_key.filter(|k| !k.trim().is_empty());
        if api_key.is_none() {
            log::warn!("OPENROUTER_API_KEY is not set, /chat will answer with an error");
        }
        Self {
            http: reqwest::Client::new(),
            api_url: api_url.into(),
            model: model.into(),
            api_key,
        }
    }

    /// Send one user message and return the first completion.
    ///
    /// No retries and no streaming.
    pub async fn reply(&self, message: &str) -> Result<String, RelayError> {
        let api_key = self.api_key.as_deref().ok_or(RelayError::MissingApiKey)?;
        let request = CompletionRequest {
            model: &self.model,
            messages: [ChatMessage {
                role: "user",
                content: message,
            }],
        };

        let response = self
            .http
            .post(&self.api_url)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(RelayError::Upstream {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        let body: CompletionResponse = response
            .json()
            .await
            .map_err(|e| RelayError::MalformedResponse(e.to_string()))?;
        body.choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| RelayError::MalformedResponse("no choices in completion".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::Json;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::post;
    use axum::Router;
    use serde_json::{json, Value};
    use std::sync::{Arc, Mutex};

    type Seen = Arc<Mutex<Vec<(Option<String>, Value)>>>;

    /// Fake completion API on an ephemeral port.
    async fn upstream(status: StatusCode, reply: Value) -> (String, Seen) {
        let seen: Seen = Arc::new(Mutex::new(Vec::new()));
        let record = seen.clone();
        let app = Router::new().route(
            "/v1/chat/completions",
            post(move |headers: HeaderMap, Json(body): Json<Value>| {
                let record = record.clone();
                let reply = reply.clone();
                async move {
                    let auth = headers
                        .get("authorization")
                        .and_then(|v| v.to_str().ok())
                        .map(str::to_string);
                    record.lock().unwrap().push((auth, body));
                    (status, Json(reply))
                }
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!(
            "http://{}/v1/chat/completions",
            listener.local_addr().unwrap()
        );
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
        (url, seen)
    }

    #[tokio::test]
    async fn test_reply_returns_first_choice() {
        let (url, seen) = upstream(
            StatusCode::OK,
            json!({"choices": [{"message": {"role": "assistant", "content": "Hi there!"}}]}),
        )
        .await;
        let relay = ChatRelay::new(url, "test-model", Some("secret".into()));

        assert_eq!(relay.reply("hello").await.unwrap(), "Hi there!");

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].0.as_deref(), Some("Bearer secret"));
        assert_eq!(
            seen[0].1,
            json!({"model": "test-model", "messages": [{"role": "user", "content": "hello"}]})
        );
    }

    #[tokio::test]
    async fn test_upstream_failure_keeps_status_and_body() {
        let (url, _) = upstream(
            StatusCode::UNAUTHORIZED,
            json!({"error": {"message": "No auth credentials found"}}),
        )
        .await;
        let relay = ChatRelay::new(url, "m", Some("bad".into()));

        match relay.reply("hello").await {
            Err(RelayError::Upstream { status, body }) => {
                assert_eq!(status, 401);
                assert!(body.contains("No auth credentials found"));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_empty_choices_is_malformed() {
        let (url, _) = upstream(StatusCode::OK, json!({"choices": []})).await;
        let relay = ChatRelay::new(url, "m", Some("k".into()));
        assert!(matches!(
            relay.reply("hello").await,
            Err(RelayError::MalformedResponse(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_key_never_calls_upstream() {
        let (url, seen) = upstream(StatusCode::OK, json!({})).await;
        let relay = ChatRelay::new(url, "m", Some("  ".into()));
        assert!(matches!(
            relay.reply("hello").await,
            Err(RelayError::MissingApiKey)
        ));
        assert!(seen.lock().unwrap().is_empty());
    }
}
