//! The ordered transcript of the conversation.
//!
//! The transcript is owned and mutated by exactly one thread (the UI
//! thread); background producers communicate changes over channels instead
//! of sharing the list. That keeps token-arrival order and render order the
//! same by construction.

use super::types::{Speaker, Turn};

#[derive(Debug, Default)]
pub struct Transcript {
    turns: Vec<Turn>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn clear(&mut self) {
        self.turns.clear();
    }

    /// Append a turn.
    ///
    /// Appending closes any prior in-progress turn first, so at most one
    /// turn is ever streaming and it is always the last one.
    pub fn push(&mut self, turn: Turn) {
        self.finish_in_progress();
        self.turns.push(turn);
    }

    /// The in-progress bot turn, if the last turn is still streaming.
    pub fn in_progress_mut(&mut self) -> Option<&mut Turn> {
        self.turns
            .last_mut()
            .filter(|t| t.streaming && t.speaker == Speaker::Bot)
    }

    pub fn in_progress(&self) -> Option<&Turn> {
        self.turns
            .last()
            .filter(|t| t.streaming && t.speaker == Speaker::Bot)
    }

    /// Replace the content of the in-progress turn. Returns false when no
    /// turn is in progress.
    pub fn set_in_progress_content(&mut self, content: impl Into<String>) -> bool {
        match self.in_progress_mut() {
            Some(turn) => {
                turn.content = content.into();
                true
            }
            None => false,
        }
    }

    /// Mark the in-progress turn finished; it is immutable afterwards.
    pub fn finish_in_progress(&mut self) {
        if let Some(turn) = self.in_progress_mut() {
            turn.streaming = false;
        }
    }
}
