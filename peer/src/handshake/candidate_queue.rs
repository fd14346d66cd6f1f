use std::collections::VecDeque;

use serde_json::Value;

/// Remote candidates that arrived before the remote description, in
/// receipt order.
#[derive(Debug, Default)]
pub struct CandidateQueue {
    pending: VecDeque<Value>,
}

impl CandidateQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, candidate: Value) {
        self.pending.push_back(candidate);
    }

    /// Empties the queue, oldest first.
    pub fn drain(&mut self) -> impl Iterator<Item = Value> + '_ {
        self.pending.drain(..)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }
}
