//! Bounded conversation transcript

use crate::llm::{ConversationTurn, MessageRole};
use std::collections::VecDeque;

pub const DEFAULT_WINDOW: usize = 8;

/// Leading system turn plus the most recent `window` exchanges.
///
/// Holds at most `2 * window` non-system turns; pushing past that evicts the
/// oldest non-system turn. The system turn and the newest turn are never
/// evicted.
#[derive(Debug, Clone)]
pub struct SessionMemory {
    system: ConversationTurn,
    turns: VecDeque<ConversationTurn>,
    window: usize,
}

impl SessionMemory {
    pub fn new(system_prompt: impl Into<String>, window: usize) -> Self {
        Self {
            system: ConversationTurn::system(system_prompt),
            turns: VecDeque::with_capacity(window * 2 + 1),
            window,
        }
    }

    fn capacity(&self) -> usize {
        (self.window * 2).max(1)
    }

    pub fn push_user(&mut self, content: impl Into<String>) {
        self.push(ConversationTurn::user(content));
    }

    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.push(ConversationTurn::assistant(content));
    }

    fn push(&mut self, turn: ConversationTurn) {
        debug_assert_ne!(turn.role, MessageRole::System);
        self.turns.push_back(turn);
        while self.turns.len() > self.capacity() {
            self.turns.pop_front();
        }
    }

    /// Number of retained turns, system turn included
    pub fn len(&self) -> usize {
        self.turns.len() + 1
    }

    #[allow(dead_code)] // Used in tests
    pub fn last(&self) -> &ConversationTurn {
        self.turns.back().unwrap_or(&self.system)
    }

    /// Full transcript in send order, system turn first
    pub fn transcript(&self) -> Vec<ConversationTurn> {
        std::iter::once(&self.system)
            .chain(self.turns.iter())
            .cloned()
            .collect()
    }
}
