use chrono::{DateTime, Utc};
use relay_core::{RelayError, RelayResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Who produced a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The person chatting.
    User,
    /// The agent.
    Model,
}

/// One message in a session's conversation history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    /// Who said it.
    pub role: Role,
    /// What was said.
    pub text: String,
}

impl Turn {
    /// A user turn.
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
        }
    }

    /// A model turn.
    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: Role::Model,
            text: text.into(),
        }
    }
}

/// One conversation owned by a user of an app.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Random session identifier.
    pub id: String,
    /// App the session belongs to.
    pub app_name: String,
    /// Owner; runs on behalf of anyone else are rejected.
    pub user_id: String,
    /// Conversation so far, oldest first.
    pub history: Vec<Turn>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Time of the last appended turn.
    pub updated_at: DateTime<Utc>,
}

impl Session {
    /// A fresh session with a random id and empty history.
    pub fn new(app_name: impl Into<String>, user_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            app_name: app_name.into(),
            user_id: user_id.into(),
            history: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Append a turn and touch `updated_at`.
    pub fn push(&mut self, turn: Turn) {
        self.updated_at = Utc::now();
        self.history.push(turn);
    }
}

/// Process-local session store. Nothing survives a restart.
#[derive(Default)]
pub struct InMemorySessionService {
    sessions: RwLock<HashMap<String, Session>>,
}

impl InMemorySessionService {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create and store a new session.
    pub async fn create(&self, app_name: &str, user_id: &str) -> Session {
        let session = Session::new(app_name, user_id);
        self.sessions
            .write()
            .await
            .insert(session.id.clone(), session.clone());
        tracing::debug!(session_id = %session.id, app_name, user_id, "Session created");
        session
    }

    /// A snapshot of the session, if it exists.
    pub async fn get(&self, id: &str) -> Option<Session> {
        self.sessions.read().await.get(id).cloned()
    }

    /// Append a turn and return the updated history.
    pub async fn append(&self, id: &str, turn: Turn) -> RelayResult<Vec<Turn>> {
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .get_mut(id)
            .ok_or_else(|| RelayError::Session(format!("Session not found: {id}")))?;
        session.push(turn);
        Ok(session.history.clone())
    }

    /// Drop a session; unknown ids are ignored.
    pub async fn remove(&self, id: &str) {
        if self.sessions.write().await.remove(id).is_some() {
            tracing::debug!(session_id = %id, "Session removed");
        }
    }

    /// Number of live sessions.
    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}
