use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The normalized unit written to the client as the `data` of one SSE frame.
///
/// Within one run the client sees exactly one `AgentStart` first, any number
/// of `TextChunk`s, and exactly one terminal `Complete` or `Error` last.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SsePayload {
    /// The run has started.
    AgentStart {
        timestamp: DateTime<Utc>,
        session_id: String,
    },

    /// A piece of assistant text. `partial` is `false` only for a single
    /// aggregated result from a non-streaming runtime.
    TextChunk { partial: bool, data: String },

    /// The run failed. Terminal.
    Error {
        timestamp: DateTime<Utc>,
        error: String,
    },

    /// The run finished. Terminal.
    Complete {
        timestamp: DateTime<Utc>,
        session_id: String,
    },
}

impl SsePayload {
    /// Whether no payload may follow this one.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Error { .. } | Self::Complete { .. })
    }

    /// The `type` discriminant as written on the wire.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::AgentStart { .. } => "agent_start",
            Self::TextChunk { .. } => "text_chunk",
            Self::Error { .. } => "error",
            Self::Complete { .. } => "complete",
        }
    }
}
