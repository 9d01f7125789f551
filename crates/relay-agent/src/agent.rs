use crate::backends::claude::ClaudeBackend;
use crate::backends::openai::OpenAiBackend;
use crate::backends::{ModelBackend, ModelRequest};
use crate::config::{AgentConfig, LlmProvider};
use crate::runtime::EventSink;
use crate::session::Turn;
use relay_core::RelayResult;

/// An LLM-backed agent: a named instruction bound to a model backend.
///
/// Uses the `ModelBackend` trait to abstract away provider-specific API differences.
pub struct LlmAgent {
    /// Agent name, stamped as the author of its events.
    pub name: String,
    /// Free-form description.
    pub description: String,
    /// System instruction sent with every model call.
    pub instruction: String,
    backend: Box<dyn ModelBackend>,
}

impl LlmAgent {
    /// Build an agent and its backend from configuration.
    pub fn new(config: AgentConfig) -> Self {
        let backend: Box<dyn ModelBackend> = match config.model.provider {
            LlmProvider::Claude => Box::new(ClaudeBackend::new(config.model)),
            LlmProvider::OpenAi => Box::new(OpenAiBackend::new(config.model)),
        };
        Self {
            name: config.name,
            description: config.description,
            instruction: config.instruction,
            backend,
        }
    }

    /// Create from a pre-built backend (for custom/external providers).
    pub fn from_backend(
        name: impl Into<String>,
        instruction: impl Into<String>,
        backend: Box<dyn ModelBackend>,
    ) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            instruction: instruction.into(),
            backend,
        }
    }

    /// Answer the last turn of `history`, streaming events into `sink`.
    pub async fn respond(&self, history: Vec<Turn>, sink: &EventSink) -> RelayResult<String> {
        let request = ModelRequest {
            system_prompt: (!self.instruction.is_empty()).then(|| self.instruction.clone()),
            history,
        };
        self.backend.generate(&request, sink).await
    }
}
