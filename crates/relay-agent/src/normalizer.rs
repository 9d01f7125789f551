//! Translation of a run's agent events into SSE payloads.
//!
//! The output always opens with `agent_start` and closes with exactly one of
//! `complete` or `error`. Text chunks in between keep upstream order.
//!
//! Once any partial chunk has been forwarded, every later non-partial event of
//! the same run is dropped: it repeats text the partials already delivered.
//! This holds for the whole run, not just the message the partials belonged to.

use chrono::{DateTime, Utc};
use futures_util::{stream, Stream, StreamExt};
use relay_core::{AgentEvent, EventContent, RelayResult, SsePayload};
use tracing::debug;

/// Source of payload timestamps.
pub type Clock = fn() -> DateTime<Utc>;

/// Turns agent event streams into SSE payload streams.
#[derive(Debug, Clone, Copy)]
pub struct EventNormalizer {
    clock: Clock,
}

impl Default for EventNormalizer {
    fn default() -> Self {
        Self { clock: Utc::now }
    }
}

enum State<S> {
    Start {
        upstream: S,
        session_id: String,
    },
    Streaming {
        upstream: S,
        session_id: String,
        saw_partial: bool,
    },
    Done,
}

impl EventNormalizer {
    /// A normalizer stamping payloads with the system clock.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `clock` for timestamps instead of the system clock.
    pub fn with_clock(clock: Clock) -> Self {
        Self { clock }
    }

    /// Lazily normalize `upstream`. One upstream event is pulled per poll, and
    /// nothing is pulled after a failure.
    pub fn normalize<S>(
        &self,
        upstream: S,
        session_id: impl Into<String>,
    ) -> impl Stream<Item = SsePayload> + Send
    where
        S: Stream<Item = RelayResult<AgentEvent>> + Send + Unpin,
    {
        let clock = self.clock;
        let initial = State::Start {
            upstream,
            session_id: session_id.into(),
        };

        stream::unfold(initial, move |state| async move {
            match state {
                State::Start {
                    upstream,
                    session_id,
                } => {
                    let payload = SsePayload::AgentStart {
                        timestamp: clock(),
                        session_id: session_id.clone(),
                    };
                    let next = State::Streaming {
                        upstream,
                        session_id,
                        saw_partial: false,
                    };
                    Some((payload, next))
                }
                State::Streaming {
                    mut upstream,
                    session_id,
                    mut saw_partial,
                } => loop {
                    let event = match upstream.next().await {
                        Some(Ok(event)) => event,
                        Some(Err(e)) => {
                            let payload = SsePayload::Error {
                                timestamp: clock(),
                                error: e.to_string(),
                            };
                            return Some((payload, State::Done));
                        }
                        None => {
                            let payload = SsePayload::Complete {
                                timestamp: clock(),
                                session_id,
                            };
                            return Some((payload, State::Done));
                        }
                    };

                    let text = event.text();
                    debug!(
                        partial = event.partial,
                        content_shape = event.content.as_ref().map_or("none", EventContent::shape),
                        text_len = text.len(),
                        "Agent event"
                    );

                    if text.is_empty() {
                        continue;
                    }

                    if event.partial {
                        saw_partial = true;
                    } else if saw_partial {
                        continue;
                    }

                    let payload = SsePayload::TextChunk {
                        partial: event.partial,
                        data: text,
                    };
                    let next = State::Streaming {
                        upstream,
                        session_id,
                        saw_partial,
                    };
                    return Some((payload, next));
                },
                State::Done => None,
            }
        })
    }
}
