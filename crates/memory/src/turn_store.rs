//! Append-only transcript of displayed turns.

use llmdesk_core::turn::Turn;
use serde::{Deserialize, Serialize};

/// Ordered transcript for one page in one session.
///
/// Turns are never deduplicated, edited, or removed. The store lives as long
/// as the owning session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TurnStore {
    turns: Vec<Turn>,
}

impl TurnStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a turn at the end of the transcript.
    pub fn record(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    /// The full transcript in arrival order.
    pub fn all(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}
