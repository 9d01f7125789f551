use super::{ModelBackend, ModelRequest, SseLines};
use crate::config::ModelConfig;
use crate::runtime::EventSink;
use crate::session::{Role, Turn};
use async_trait::async_trait;
use futures_util::StreamExt;
use relay_core::{AgentEvent, RelayError, RelayResult};
use serde::Serialize;
use tracing::debug;

/// Claude (Anthropic) Messages API backend.
pub struct ClaudeBackend {
    config: ModelConfig,
    http: reqwest::Client,
}

impl ClaudeBackend {
    /// Create a backend for `config`.
    pub fn new(config: ModelConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }

    fn build_body(&self, request: &ModelRequest, stream: bool) -> serde_json::Value {
        let api_messages: Vec<ClaudeMessage> = request.history.iter().map(ClaudeMessage::from).collect();

        let mut body = serde_json::json!({
            "model": self.config.model_id,
            "max_tokens": self.config.max_tokens,
            "temperature": self.config.temperature,
            "messages": api_messages,
        });

        if let Some(sys) = &request.system_prompt {
            body["system"] = serde_json::json!(sys);
        }
        if stream {
            body["stream"] = serde_json::json!(true);
        }
        body
    }

    async fn send(&self, body: &serde_json::Value) -> RelayResult<reqwest::Response> {
        let url = format!("{}/v1/messages", self.config.base_url());

        let resp = self
            .http
            .post(&url)
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| RelayError::Http(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let error_body = resp
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(RelayError::Http(format!(
                "Claude API error {status}: {error_body}"
            )));
        }
        Ok(resp)
    }

    async fn generate_once(&self, request: &ModelRequest, sink: &EventSink) -> RelayResult<String> {
        let resp = self.send(&self.build_body(request, false)).await?;
        let body: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| RelayError::Http(e.to_string()))?;

        let text = parse_claude_response(&body)?;
        sink.emit(AgentEvent::final_text(&text)).await?;
        Ok(text)
    }

    async fn generate_streaming(
        &self,
        request: &ModelRequest,
        sink: &EventSink,
    ) -> RelayResult<String> {
        let resp = self.send(&self.build_body(request, true)).await?;

        let mut stream = resp.bytes_stream();
        let mut lines = SseLines::default();
        let mut full_text = String::new();

        while let Some(chunk_result) = stream.next().await {
            let chunk =
                chunk_result.map_err(|e| RelayError::Http(format!("Stream read error: {e}")))?;

            for data in lines.push(&chunk) {
                let event: serde_json::Value = match serde_json::from_str(&data) {
                    Ok(v) => v,
                    Err(_) => continue,
                };

                match event["type"].as_str().unwrap_or("") {
                    "content_block_delta" => {
                        let delta = &event["delta"];
                        if delta["type"].as_str() == Some("text_delta") {
                            if let Some(text) = delta["text"].as_str() {
                                full_text.push_str(text);
                                sink.emit(AgentEvent::partial_text(text)).await?;
                            }
                        }
                    }
                    "message_delta" => {
                        if let Some(reason) = event["delta"]["stop_reason"].as_str() {
                            debug!(stop_reason = reason, "Claude stream stopping");
                        }
                    }
                    "error" => {
                        let message = event["error"]["message"]
                            .as_str()
                            .unwrap_or("unknown stream error");
                        return Err(RelayError::Agent(format!("Claude stream error: {message}")));
                    }
                    _ => {}
                }
            }
        }

        sink.emit(AgentEvent::final_text(&full_text)).await?;
        Ok(full_text)
    }
}

#[async_trait]
impl ModelBackend for ClaudeBackend {
    async fn generate(&self, request: &ModelRequest, sink: &EventSink) -> RelayResult<String> {
        if self.config.streaming {
            self.generate_streaming(request, sink).await
        } else {
            self.generate_once(request, sink).await
        }
    }
}

// -- Claude wire types --

#[derive(Serialize)]
struct ClaudeMessage {
    role: &'static str,
    content: String,
}

impl From<&Turn> for ClaudeMessage {
    fn from(turn: &Turn) -> Self {
        Self {
            role: match turn.role {
                Role::User => "user",
                Role::Model => "assistant",
            },
            content: turn.text.clone(),
        }
    }
}

/// Join the text blocks of a non-streaming Messages API response.
pub fn parse_claude_response(body: &serde_json::Value) -> RelayResult<String> {
    let content = body["content"]
        .as_array()
        .ok_or_else(|| RelayError::Agent("Missing content in Claude response".into()))?;

    let text_parts: Vec<&str> = content
        .iter()
        .filter(|block| block["type"].as_str() == Some("text"))
        .filter_map(|block| block["text"].as_str())
        .collect();

    Ok(text_parts.join("\n"))
}
