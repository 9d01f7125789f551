use super::{ModelBackend, ModelRequest, SseLines};
use crate::config::ModelConfig;
use crate::runtime::EventSink;
use crate::session::Role;
use async_trait::async_trait;
use futures_util::StreamExt;
use relay_core::{AgentEvent, EventContent, RelayError, RelayResult};

/// OpenAI-compatible chat completions backend.
///
/// Final results are reported as message-shaped content (`{content}`), the
/// way LiteLLM-style proxies hand back a completed message.
pub struct OpenAiBackend {
    config: ModelConfig,
    http: reqwest::Client,
}

impl OpenAiBackend {
    /// Create a backend for `config`.
    pub fn new(config: ModelConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }

    fn build_messages(&self, request: &ModelRequest) -> Vec<serde_json::Value> {
        let mut api_messages = Vec::with_capacity(request.history.len() + 1);

        if let Some(sys) = &request.system_prompt {
            api_messages.push(serde_json::json!({"role": "system", "content": sys}));
        }

        for turn in &request.history {
            let role = match turn.role {
                Role::User => "user",
                Role::Model => "assistant",
            };
            api_messages.push(serde_json::json!({"role": role, "content": turn.text}));
        }
        api_messages
    }

    async fn send(&self, request: &ModelRequest, stream: bool) -> RelayResult<reqwest::Response> {
        let url = format!("{}/v1/chat/completions", self.config.base_url());

        let body = serde_json::json!({
            "model": self.config.model_id,
            "max_tokens": self.config.max_tokens,
            "temperature": self.config.temperature,
            "messages": self.build_messages(request),
            "stream": stream,
        });

        let resp = self
            .http
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&body)
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
                "OpenAI API error {status}: {error_body}"
            )));
        }
        Ok(resp)
    }

    async fn generate_once(&self, request: &ModelRequest, sink: &EventSink) -> RelayResult<String> {
        let resp = self.send(request, false).await?;
        let body: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| RelayError::Http(e.to_string()))?;

        let text = parse_openai_response(&body)?;
        sink.emit(final_message(&text)).await?;
        Ok(text)
    }

    async fn generate_streaming(
        &self,
        request: &ModelRequest,
        sink: &EventSink,
    ) -> RelayResult<String> {
        let resp = self.send(request, true).await?;

        let mut stream = resp.bytes_stream();
        let mut lines = SseLines::default();
        let mut full_text = String::new();

        while let Some(chunk_result) = stream.next().await {
            let chunk =
                chunk_result.map_err(|e| RelayError::Http(format!("Stream read error: {e}")))?;

            for data in lines.push(&chunk) {
                if data == "[DONE]" {
                    continue;
                }

                let event: serde_json::Value = match serde_json::from_str(&data) {
                    Ok(v) => v,
                    Err(_) => continue,
                };

                if let Some(message) = event["error"]["message"].as_str() {
                    return Err(RelayError::Agent(format!("OpenAI stream error: {message}")));
                }

                if let Some(content) = event["choices"][0]["delta"]["content"].as_str() {
                    if !content.is_empty() {
                        full_text.push_str(content);
                        sink.emit(AgentEvent::partial_text(content)).await?;
                    }
                }
            }
        }

        sink.emit(final_message(&full_text)).await?;
        Ok(full_text)
    }
}

fn final_message(text: &str) -> AgentEvent {
    AgentEvent::new(
        Some(EventContent::Message {
            content: text.to_string(),
        }),
        false,
    )
}

#[async_trait]
impl ModelBackend for OpenAiBackend {
    async fn generate(&self, request: &ModelRequest, sink: &EventSink) -> RelayResult<String> {
        if self.config.streaming {
            self.generate_streaming(request, sink).await
        } else {
            self.generate_once(request, sink).await
        }
    }
}

/// Text of the first choice of a non-streaming completion.
pub fn parse_openai_response(body: &serde_json::Value) -> RelayResult<String> {
    let message = &body["choices"][0]["message"];
    if message.is_null() {
        return Err(RelayError::Agent(
            "Missing choices in OpenAI response".to_string(),
        ));
    }
    Ok(message["content"].as_str().unwrap_or_default().to_string())
}
