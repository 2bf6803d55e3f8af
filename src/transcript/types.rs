use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Speaker {
    User,
    Bot,
}

/// One turn of the conversation.
///
/// Turns are append-only. The only mutable turn is the most recent Bot turn
/// while its exchange is streaming; it becomes immutable once the exchange
/// finishes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    pub id: Uuid,
    pub speaker: Speaker,
    pub content: String,
    pub streaming: bool,
    pub timestamp: DateTime<Utc>,
}

impl Turn {
    pub fn new(speaker: Speaker, content: impl Into<String>, streaming: bool) -> Self {
        Self {
            id: Uuid::new_v4(),
            speaker,
            content: content.into(),
            streaming,
            timestamp: Utc::now(),
        }
    }

    /// A finished user turn.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Speaker::User, content, false)
    }

    /// A finished bot turn.
    pub fn bot(content: impl Into<String>) -> Self {
        Self::new(Speaker::Bot, content, false)
    }

    /// A bot turn still receiving tokens.
    pub fn bot_in_progress(content: impl Into<String>) -> Self {
        Self::new(Speaker::Bot, content, true)
    }

    pub fn is_user(&self) -> bool {
        self.speaker == Speaker::User
    }
}
