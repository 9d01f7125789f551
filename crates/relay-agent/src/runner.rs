use crate::agent::LlmAgent;
use crate::runtime::{AgentEventStream, AgentRuntime, EventSink};
use crate::session::{InMemorySessionService, Turn};
use async_trait::async_trait;
use relay_core::{RelayError, RelayResult};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{info, warn};

const EVENT_BUFFER: usize = 256;

/// Runs an [`LlmAgent`] against process-local sessions.
///
/// A session lives for exactly one run: it is dropped when the run ends,
/// fails, or its consumer goes away.
pub struct InMemoryRunner {
    agent: Arc<LlmAgent>,
    sessions: Arc<InMemorySessionService>,
}

impl InMemoryRunner {
    /// A runner for `agent` with an empty session store.
    pub fn new(agent: LlmAgent) -> Self {
        Self {
            agent: Arc::new(agent),
            sessions: Arc::new(InMemorySessionService::new()),
        }
    }

    /// Sessions currently held by this runner.
    pub fn sessions(&self) -> &Arc<InMemorySessionService> {
        &self.sessions
    }
}

#[async_trait]
impl AgentRuntime for InMemoryRunner {
    async fn create_session(&self, app_name: &str, user_id: &str) -> RelayResult<String> {
        Ok(self.sessions.create(app_name, user_id).await.id)
    }

    fn run(&self, session_id: &str, user_id: &str, message: &str) -> AgentEventStream {
        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        let sink = EventSink::new(tx).with_author(self.agent.name.clone());

        let agent = self.agent.clone();
        let sessions = self.sessions.clone();
        let session_id = session_id.to_string();
        let user_id = user_id.to_string();
        let message = message.to_string();

        tokio::spawn(async move {
            tokio::select! {
                result = run_turn(&agent, &sessions, &session_id, &user_id, message, &sink) => {
                    match result {
                        Ok(reply) => {
                            info!(session_id = %session_id, reply_len = reply.len(), "Agent run completed");
                        }
                        Err(e) if sink.is_closed() => {
                            info!(session_id = %session_id, reason = %e, "Agent run abandoned by consumer");
                        }
                        Err(e) => {
                            warn!(session_id = %session_id, error = %e, "Agent run failed");
                            sink.fail(e).await;
                        }
                    }
                }
                () = sink.closed() => {
                    info!(session_id = %session_id, "Consumer disconnected, agent run cancelled");
                }
            }

            sessions.remove(&session_id).await;
        });

        Box::pin(ReceiverStream::new(rx))
    }
}

async fn run_turn(
    agent: &LlmAgent,
    sessions: &InMemorySessionService,
    session_id: &str,
    user_id: &str,
    message: String,
    sink: &EventSink,
) -> RelayResult<String> {
    let session = sessions
        .get(session_id)
        .await
        .ok_or_else(|| RelayError::Session(format!("Session not found: {session_id}")))?;

    if session.user_id != user_id {
        return Err(RelayError::Session(format!(
            "Session {session_id} does not belong to user {user_id}"
        )));
    }

    let history = sessions.append(session_id, Turn::user(message)).await?;

    info!(
        session_id = %session_id,
        agent = %agent.name,
        turns = history.len(),
        "Starting agent run"
    );

    agent.respond(history, sink).await
}
