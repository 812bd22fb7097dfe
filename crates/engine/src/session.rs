//! Per-session conversation windows.
//!
//! Each session owns one [`ConversationWindow`] behind its own async mutex.
//! Callers hold that mutex across "snapshot history → call service → append
//! exchange", which serializes queries on the same session. The registry
//! itself is bounded: when it is full, the session idle for longest is
//! dropped. A session with a request in flight is never dropped.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use helpline_core::{ChatMessage, ConversationWindow};
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

/// A session's window, shared between the registry and in-flight requests.
pub type SharedWindow = Arc<Mutex<ConversationWindow>>;

struct SessionEntry {
    window: SharedWindow,
    last_active: DateTime<Utc>,
}

pub struct SessionStore {
    sessions: RwLock<HashMap<String, SessionEntry>>,
    max_messages: usize,
    max_sessions: usize,
}

impl SessionStore {
    pub fn new(max_messages: usize, max_sessions: usize) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            max_messages,
            max_sessions: max_sessions.max(1),
        }
    }

    /// The window of `session_id`, created empty on first use.
    pub async fn window(&self, session_id: &str) -> SharedWindow {
        let mut sessions = self.sessions.write().await;
        let now = Utc::now();

        if let Some(entry) = sessions.get_mut(session_id) {
            entry.last_active = now;
            return entry.window.clone();
        }

        // Only sessions no request currently holds can be evicted. When every
        // session is busy the registry grows past its bound until they finish.
        while sessions.len() >= self.max_sessions {
            let oldest_idle = sessions
                .iter()
                .filter(|(_, e)| Arc::strong_count(&e.window) == 1)
                .min_by_key(|(_, e)| e.last_active)
                .map(|(id, _)| id.clone());
            let Some(id) = oldest_idle else {
                debug!(sessions = sessions.len(), "All sessions busy; exceeding bound");
                break;
            };
            sessions.remove(&id);
            debug!(session = %id, "Evicted idle session");
        }

        let window = Arc::new(Mutex::new(ConversationWindow::new(self.max_messages)));
        sessions.insert(
            session_id.to_string(),
            SessionEntry {
                window: window.clone(),
                last_active: now,
            },
        );
        window
    }

    /// The window of an existing session, without creating one.
    pub async fn get(&self, session_id: &str) -> Option<SharedWindow> {
        self.sessions
            .read()
            .await
            .get(session_id)
            .map(|entry| entry.window.clone())
    }

    /// Snapshot of a session's messages, oldest first. Unknown sessions
    /// have no history.
    pub async fn history(&self, session_id: &str) -> Vec<ChatMessage> {
        let Some(window) = self.get(session_id).await else {
            return Vec::new();
        };
        let window = window.lock().await;
        window.messages().to_vec()
    }

    /// Clear a session's window. Returns whether the session existed.
    pub async fn reset(&self, session_id: &str) -> bool {
        match self.get(session_id).await {
            Some(window) => {
                window.lock().await.clear();
                true
            }
            None => false,
        }
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    pub fn max_messages(&self) -> usize {
        self.max_messages
    }
}
