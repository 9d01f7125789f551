//! Agent runtime, model backends and the agent-event to SSE normalizer.

/// The LLM agent definition.
pub mod agent;
/// Provider-specific model backends.
pub mod backends;
/// Agent and model configuration.
pub mod config;
/// Agent events to SSE payloads.
pub mod normalizer;
/// In-process agent runner.
pub mod runner;
/// The runtime seam the gateway drives.
pub mod runtime;
/// In-memory sessions.
pub mod session;

pub use agent::LlmAgent;
pub use config::{AgentConfig, LlmProvider, ModelConfig};
pub use normalizer::EventNormalizer;
pub use runner::InMemoryRunner;
pub use runtime::{AgentEventStream, AgentRuntime, EventSink};
pub use session::{InMemorySessionService, Session, Turn};
