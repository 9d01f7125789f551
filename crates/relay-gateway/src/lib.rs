//! HTTP gateway for agent-relay.
//!
//! Exposes the chat relay as Server-Sent Events at `POST /api/chat`, the
//! sandbox smoke test and insurance flow, a health check, and optionally a
//! static frontend.

/// The SSE chat endpoint.
pub mod chat;
/// Gateway settings.
pub mod config;
/// JSON error responses.
pub mod error;
/// Router, shared state and the remaining handlers.
pub mod server;

pub use chat::{ChatRequest, WEB_USER};
pub use config::GatewayConfig;
pub use error::ApiError;
pub use server::{AppState, GatewayServer};
