use crate::error::ApiError;
use crate::server::AppState;
use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::Json;
use futures_util::{Stream, StreamExt};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info};

/// User every chat session is created for.
pub const WEB_USER: &str = "web_user";

/// Body of `POST /api/chat`.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    /// The user message to relay.
    pub message: String,
    /// Accepted for client compatibility; every request runs in a new session.
    #[serde(default)]
    pub session_id: Option<String>,
}

/// `POST /api/chat`: relay one message to the agent and stream the normalized
/// payloads back, one SSE `data:` frame each.
pub async fn chat_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ChatRequest>,
) -> Result<Sse<impl Stream<Item = Result<Event, axum::Error>>>, ApiError> {
    if let Some(requested) = &req.session_id {
        debug!(requested_session = %requested, "Client session id ignored");
    }

    let session_id = state
        .runtime
        .create_session(&state.config.app_name, WEB_USER)
        .await?;

    info!(
        session_id = %session_id,
        message_len = req.message.len(),
        "Relaying chat message"
    );

    let upstream = state.runtime.run(&session_id, WEB_USER, &req.message);
    let frames = state
        .normalizer
        .normalize(upstream, session_id)
        .map(|payload| Event::default().json_data(payload));

    Ok(Sse::new(frames).keep_alive(KeepAlive::default()))
}
