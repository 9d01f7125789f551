/// Anthropic Messages API.
pub mod claude;
/// OpenAI-compatible chat completions.
pub mod openai;

use crate::runtime::EventSink;
use crate::session::Turn;
use async_trait::async_trait;
use relay_core::RelayResult;

/// Everything a backend needs for one model call.
#[derive(Debug, Clone)]
pub struct ModelRequest {
    /// Agent instruction, sent as the system prompt.
    pub system_prompt: Option<String>,
    /// Conversation so far, ending with the new user turn.
    pub history: Vec<Turn>,
}

/// Trait for LLM provider backends.
///
/// A backend turns one model call into agent events: zero or more partial
/// events while text arrives, then one final aggregated event. It returns the
/// aggregated text.
///
/// To add a new provider:
/// 1. Create a new module in `backends/`
/// 2. Implement `ModelBackend` for your struct
/// 3. Add the variant to `LlmProvider` in `config.rs`
/// 4. Wire it up in `LlmAgent::new()` in `agent.rs`
#[async_trait]
pub trait ModelBackend: Send + Sync {
    /// Run one model call, forwarding events to `sink` as they are produced.
    async fn generate(&self, request: &ModelRequest, sink: &EventSink) -> RelayResult<String>;
}

/// Splits a byte stream of `text/event-stream` into `data:` payloads.
///
/// Chunks may end mid-line, or mid-character; bytes are kept until a full line
/// has arrived and only whole lines are decoded.
#[derive(Debug, Default)]
pub(crate) struct SseLines {
    buffer: Vec<u8>,
}

impl SseLines {
    pub(crate) fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(chunk);

        let mut data = Vec::new();
        while let Some(line_end) = self.buffer.iter().position(|&b| b == b'\n') {
            let raw: Vec<u8> = self.buffer.drain(..=line_end).collect();
            let decoded = String::from_utf8_lossy(&raw[..line_end]);
            let line = decoded.trim();

            if line.is_empty() || line.starts_with(':') {
                continue;
            }

            if let Some(payload) = line.strip_prefix("data:") {
                data.push(payload.trim_start().to_string());
            }
        }
        data
    }
}
