use serde::{Deserialize, Serialize};

/// Which model API an agent talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    /// Anthropic Messages API.
    Claude,
    /// Any OpenAI-compatible chat completions API (OpenAI, LiteLLM proxy, ...).
    OpenAi,
}

/// Model and API settings for one agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Model API to call.
    pub provider: LlmProvider,
    /// Provider model identifier.
    pub model_id: String,
    /// API key; usually supplied through the environment.
    #[serde(default)]
    pub api_key: String,
    /// Override for the provider's base URL (proxies, tests).
    pub api_base_url: Option<String>,
    /// Sampling temperature.
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Upper bound on generated tokens per reply.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Stream partial text events. When off, a run yields one final event.
    #[serde(default = "default_streaming")]
    pub streaming: bool,
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_tokens() -> u32 {
    4096
}

fn default_streaming() -> bool {
    true
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            provider: LlmProvider::Claude,
            model_id: "claude-sonnet-4-5-20250929".to_string(),
            api_key: String::new(),
            api_base_url: None,
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            streaming: default_streaming(),
        }
    }
}

impl ModelConfig {
    /// Base URL requests go to, without a trailing path.
    pub fn base_url(&self) -> &str {
        if let Some(url) = &self.api_base_url {
            url
        } else {
            match self.provider {
                LlmProvider::Claude => "https://api.anthropic.com",
                LlmProvider::OpenAi => "https://api.openai.com",
            }
        }
    }
}

/// Definition of the agent a runner executes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Agent name (default: "HelloWorldAgent").
    #[serde(default = "default_agent_name")]
    pub name: String,
    /// Free-form description.
    #[serde(default = "default_description")]
    pub description: String,
    /// System instruction sent with every model call.
    #[serde(default = "default_instruction")]
    pub instruction: String,
    /// Model the agent runs on.
    #[serde(default)]
    pub model: ModelConfig,
}

fn default_agent_name() -> String {
    "HelloWorldAgent".to_string()
}

fn default_description() -> String {
    "Hello World agent relayed over SSE".to_string()
}

fn default_instruction() -> String {
    "You are a friendly assistant. Respond warmly and briefly.".to_string()
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: default_agent_name(),
            description: default_description(),
            instruction: default_instruction(),
            model: ModelConfig::default(),
        }
    }
}
