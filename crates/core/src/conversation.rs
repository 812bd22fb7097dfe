//! Bounded conversation window.
//!
//! Holds the most recent (user, assistant) exchanges of one session. The
//! window only grows by whole exchanges and evicts whole exchanges, oldest
//! first, so it always has an even number of messages and never exceeds its
//! bound.

use serde::Serialize;

use crate::message::{ChatMessage, Role};

/// Default bound: the last 5 exchanges.
pub const DEFAULT_MAX_MESSAGES: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConversationWindow {
    messages: Vec<ChatMessage>,
    #[serde(skip)]
    max_messages: usize,
}

impl ConversationWindow {
    /// A window holding at most `max_messages` messages. The bound is raised
    /// to 2 when smaller, so the latest exchange is always kept.
    pub fn new(max_messages: usize) -> Self {
        Self {
            messages: Vec::new(),
            max_messages: max_messages.max(2),
        }
    }

    pub fn max_messages(&self) -> usize {
        self.max_messages
    }

    /// Messages, oldest first.
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Number of complete exchanges held.
    pub fn exchanges(&self) -> usize {
        self.messages.len() / 2
    }

    /// The last `n` messages (fewer when the window is shorter).
    pub fn recent(&self, n: usize) -> &[ChatMessage] {
        let start = self.messages.len().saturating_sub(n);
        &self.messages[start..]
    }

    /// Append one answered exchange, evicting the oldest exchanges while the
    /// window is over its bound.
    pub fn push_exchange(&mut self, user: impl Into<String>, assistant: impl Into<String>) {
        self.messages.push(ChatMessage::user(user));
        self.messages.push(ChatMessage::assistant(assistant));

        let mut evicted = 0;
        while self.messages.len() > self.max_messages && self.messages.len() >= 2 {
            debug_assert_eq!(self.messages[0].role, Role::User);
            self.messages.drain(..2);
            evicted += 1;
        }
        if evicted > 0 {
            tracing::debug!(evicted, kept = self.messages.len(), "Evicted oldest exchanges");
        }
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }
}

impl Default for ConversationWindow {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_MESSAGES)
    }
}
