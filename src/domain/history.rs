//! Bounded rolling history of round outcomes.

use std::collections::VecDeque;

use super::outcome::{Outcome, OutcomeId};

/// Default number of outcomes retained.
pub const DEFAULT_CAPACITY: usize = 20;

/// Fixed-capacity, most-recent-first store of outcomes.
///
/// Single-writer (the feed ingestor), multi-reader. Pushing a duplicate id is
/// a no-op; pushing at capacity evicts the oldest entry. Entries are never
/// mutated after insertion.
#[derive(Debug, Clone)]
pub struct HistoryBuffer {
    entries: VecDeque<Outcome>,
    capacity: usize,
}

impl HistoryBuffer {
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Insert a new outcome at the front, evicting the oldest when full.
    ///
    /// Returns `false` without modifying the buffer when an outcome with the
    /// same id is already present.
    pub fn push(&mut self, outcome: Outcome) -> bool {
        if self.contains(&outcome.id) {
            return false;
        }
        if self.entries.len() == self.capacity {
            self.entries.pop_back();
        }
        self.entries.push_front(outcome);
        true
    }

    /// Whether an outcome with the given id is present.
    #[must_use]
    pub fn contains(&self, id: &OutcomeId) -> bool {
        self.entries.iter().any(|entry| &entry.id == id)
    }

    /// The `k` most recent outcomes, most-recent-first. `k` is clamped to the
    /// current length.
    #[must_use]
    pub fn window(&self, k: usize) -> Vec<Outcome> {
        self.entries.iter().take(k).cloned().collect()
    }

    /// All retained outcomes, most-recent-first.
    #[must_use]
    pub fn all(&self) -> Vec<Outcome> {
        self.entries.iter().cloned().collect()
    }

    /// The retained outcomes in chronological order (oldest first), as the
    /// detectors consume them.
    #[must_use]
    pub fn chronological(&self) -> Vec<Outcome> {
        self.entries.iter().rev().cloned().collect()
    }

    /// The most recent outcome, if any.
    #[must_use]
    pub fn latest(&self) -> Option<&Outcome> {
        self.entries.front()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for HistoryBuffer {
    fn default() -> Self {
        Self::new()
    }
}
