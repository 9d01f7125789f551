use async_trait::async_trait;
use futures_util::Stream;
use relay_core::{AgentEvent, RelayError, RelayResult};
use std::pin::Pin;
use tokio::sync::mpsc;

/// The events of one run. A failure ends the run; nothing follows an `Err`.
pub type AgentEventStream = Pin<Box<dyn Stream<Item = RelayResult<AgentEvent>> + Send>>;

/// An agent-execution runtime the relay can drive.
///
/// Failures that happen while running are reported inside the returned
/// stream, not by `run` itself, so callers can start their own output before
/// the runtime has done any work.
#[async_trait]
pub trait AgentRuntime: Send + Sync {
    /// Create an execution session and return its identifier.
    async fn create_session(&self, app_name: &str, user_id: &str) -> RelayResult<String>;

    /// Start running `message` in `session_id` on behalf of `user_id`.
    fn run(&self, session_id: &str, user_id: &str, message: &str) -> AgentEventStream;
}

/// Producer side of a run's event channel.
#[derive(Clone)]
pub struct EventSink {
    tx: mpsc::Sender<RelayResult<AgentEvent>>,
    author: Option<String>,
}

impl EventSink {
    /// Wrap the sending half of a run channel.
    pub fn new(tx: mpsc::Sender<RelayResult<AgentEvent>>) -> Self {
        Self { tx, author: None }
    }

    /// Stamp `author` on every emitted event that has none.
    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    /// Forward one event. Fails once the consumer has gone away, which is the
    /// producer's signal to stop working.
    pub async fn emit(&self, mut event: AgentEvent) -> RelayResult<()> {
        if event.author.is_none() {
            event.author = self.author.clone();
        }
        self.tx
            .send(Ok(event))
            .await
            .map_err(|_| RelayError::Agent("Event consumer disconnected".to_string()))
    }

    /// Forward a failure as the last item of the run.
    pub async fn fail(&self, error: RelayError) {
        let _ = self.tx.send(Err(error)).await;
    }

    /// Resolves once the consumer has gone away.
    pub async fn closed(&self) {
        self.tx.closed().await;
    }

    /// Whether the consumer has gone away.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}
