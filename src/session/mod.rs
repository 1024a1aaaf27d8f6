//! Conversation history per session.
//!
//! The agent consumes history as one formatted string; this module owns the
//! bounded storage behind it.

use crate::error::{CoursemateError, Result};
use std::collections::{HashMap, VecDeque};
use std::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

/// Store of prior exchanges, keyed by session id.
pub trait ConversationHistory: Send + Sync {
    /// Start a new, empty session and return its id.
    fn create_session(&self) -> Result<String>;

    /// Forget a session's history.
    fn clear_session(&self, session_id: &str) -> Result<()>;

    /// Formatted history, or `None` when the session has no exchanges.
    fn history(&self, session_id: &str) -> Result<Option<String>>;

    /// Record one question/answer pair.
    fn add_exchange(&self, session_id: &str, user: &str, assistant: &str) -> Result<()>;
}

/// One question and its answer.
#[derive(Debug, Clone)]
pub struct Exchange {
    pub user: String,
    pub assistant: String,
}

/// In-memory sessions keeping the most recent exchanges.
pub struct SessionManager {
    sessions: RwLock<HashMap<String, VecDeque<Exchange>>>,
    max_history: usize,
}

impl SessionManager {
    pub fn new(max_history: usize) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            max_history,
        }
    }

    /// Stored exchanges, oldest first.
    pub fn exchanges(&self, session_id: &str) -> Result<Vec<Exchange>> {
        Ok(self
            .read()?
            .get(session_id)
            .map(|e| e.iter().cloned().collect())
            .unwrap_or_default())
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, HashMap<String, VecDeque<Exchange>>>> {
        self.sessions
            .read()
            .map_err(|_| CoursemateError::Session("Session store lock poisoned".to_string()))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, HashMap<String, VecDeque<Exchange>>>> {
        self.sessions
            .write()
            .map_err(|_| CoursemateError::Session("Session store lock poisoned".to_string()))
    }
}

impl ConversationHistory for SessionManager {
    fn create_session(&self) -> Result<String> {
        let id = Uuid::new_v4().to_string();
        self.write()?.insert(id.clone(), VecDeque::new());
        debug!("Created session {}", id);
        Ok(id)
    }

    fn clear_session(&self, session_id: &str) -> Result<()> {
        self.write()?.remove(session_id);
        Ok(())
    }

    fn history(&self, session_id: &str) -> Result<Option<String>> {
        let sessions = self.read()?;
        let Some(exchanges) = sessions.get(session_id).filter(|e| !e.is_empty()) else {
            return Ok(None);
        };

        let formatted = exchanges
            .iter()
            .map(|e| format!("User: {}\nAssistant: {}", e.user, e.assistant))
            .collect::<Vec<_>>()
            .join("\n");

        Ok(Some(formatted))
    }

    fn add_exchange(&self, session_id: &str, user: &str, assistant: &str) -> Result<()> {
        let mut sessions = self.write()?;
        let exchanges = sessions.entry(session_id.to_string()).or_default();
        exchanges.push_back(Exchange {
            user: user.to_string(),
            assistant: assistant.to_string(),
        });
        while exchanges.len() > self.max_history {
            exchanges.pop_front();
        }
        Ok(())
    }
}
