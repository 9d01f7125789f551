//! Core types and error definitions for agent-relay.
//!
//! This crate provides the foundational types shared across all relay crates.
//!
//! # Main types
//!
//! - [`RelayError`]: Unified error enum for all relay subsystems.
//! - [`RelayResult`]: Convenience alias for `Result<T, RelayError>`.
//! - [`AgentEvent`]: One event produced by an agent runtime while it runs.
//! - [`EventContent`]: The alternative shapes an event's content can take.
//! - [`SsePayload`]: The normalized unit written to the browser as one SSE frame.

/// Agent events as produced by an agent runtime.
pub mod event;
/// Payloads written to the client over Server-Sent Events.
pub mod payload;

pub use event::{AgentEvent, EventContent, Part};
pub use payload::SsePayload;

// --- Error types ---

/// Top-level error type for agent-relay.
///
/// Each variant corresponds to a subsystem that can produce errors.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// An error raised by the agent runtime while creating a session or running.
    #[error("Agent error: {0}")]
    Agent(String),

    /// An error from an outbound HTTP request (model API, sandbox, email).
    #[error("HTTP error: {0}")]
    Http(String),

    /// An error related to session lookup.
    #[error("Session error: {0}")]
    Session(String),

    /// An error in configuration parsing or validation.
    #[error("Config error: {0}")]
    Config(String),

    /// An error from the remote sandbox or from command validation.
    #[error("Sandbox error: {0}")]
    Sandbox(String),

    /// A request value failed validation.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// An error from the HTTP gateway layer.
    #[error("Gateway error: {0}")]
    Gateway(String),

    /// A JSON serialization or deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A standard I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A convenience `Result` alias using [`RelayError`].
pub type RelayResult<T> = Result<T, RelayError>;
