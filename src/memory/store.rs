//! Session history storage
//!
//! Stores prior turns of a session so follow-up questions can refer
//! back to earlier answers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use uuid::Uuid;

/// Role of a message sender
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Agent,
}

/// A single message in the session history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnMessage {
    pub timestamp: DateTime<Utc>,
    pub role: MessageRole,
    pub content: String,
    /// Approximate token count for context window management
    pub token_count: usize,
}

impl TurnMessage {
    pub fn new(role: MessageRole, content: String) -> Self {
        let token_count = (content.len() + 3) / 4;

        Self {
            timestamp: Utc::now(),
            role,
            content,
            token_count,
        }
    }
}

/// Conversation history for one `(user_id, session_id)` scope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionHistory {
    pub user_id: Uuid,
    pub session_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    messages: VecDeque<TurnMessage>,
    total_tokens: usize,
}

impl SessionHistory {
    pub fn new(user_id: Uuid, session_id: Uuid) -> Self {
        Self {
            user_id,
            session_id,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            messages: VecDeque::new(),
            total_tokens: 0,
        }
    }

    /// Add a message to history
    pub fn add_message(&mut self, message: TurnMessage) {
        self.total_tokens += message.token_count;
        self.messages.push_back(message);
        self.updated_at = Utc::now();
    }

    /// Iterate over all messages, oldest first
    pub fn messages(&self) -> impl Iterator<Item = &TurnMessage> {
        self.messages.iter()
    }

    /// Get total token count (approximate)
    pub fn total_tokens(&self) -> usize {
        self.total_tokens
    }

    /// Get message count
    pub fn message_count(&self) -> usize {
        self.messages.len()
    }

    /// Drop the oldest messages until at most `keep_count` remain
    pub fn trim_to_recent(&mut self, keep_count: usize) {
        while self.messages.len() > keep_count {
            if let Some(removed) = self.messages.pop_front() {
                self.total_tokens = self.total_tokens.saturating_sub(removed.token_count);
            }
        }

        self.updated_at = Utc::now();
    }

    /// Clear history
    pub fn clear(&mut self) {
        self.messages.clear();
        self.total_tokens = 0;
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_turn_message_creation() {
        let msg = TurnMessage::new(
            MessageRole::User,
            "How much did I spend last week?".to_string(),
        );
        assert_eq!(msg.role, MessageRole::User);
        assert!(msg.token_count > 0);
    }

    #[test]
    fn test_session_history() {
        let mut history = SessionHistory::new(Uuid::new_v4(), Uuid::new_v4());

        history.add_message(TurnMessage::new(
            MessageRole::User,
            "What were my largest payments?".to_string(),
        ));
        history.add_message(TurnMessage::new(
            MessageRole::Agent,
            "Your largest payment was 120 EUR.".to_string(),
        ));

        assert_eq!(history.message_count(), 2);
        assert!(history.total_tokens() > 0);
    }

    #[test]
    fn test_trim_to_recent() {
        let mut history = SessionHistory::new(Uuid::new_v4(), Uuid::new_v4());

        for i in 0..10 {
            history.add_message(TurnMessage::new(MessageRole::User, format!("Question {}", i)));
        }

        history.trim_to_recent(5);
        assert_eq!(history.message_count(), 5);

        let expected: usize = history.messages().map(|m| m.token_count).sum();
        assert_eq!(history.total_tokens(), expected);
    }
}
