//! # Dead Letter Log
//!
//! Events whose enrichment read failed. Kept for operators; never replayed.

use std::collections::VecDeque;

use shared_bus::DeadLetter;

/// Bounded, oldest-first log of dead letters.
#[derive(Debug, Clone)]
pub struct DeadLetterLog {
    capacity: usize,
    letters: VecDeque<DeadLetter>,
    total: u64,
}

impl DeadLetterLog {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            letters: VecDeque::with_capacity(capacity),
            total: 0,
        }
    }

    /// Record a letter, evicting the oldest when full.
    pub fn push(&mut self, letter: DeadLetter) {
        if self.letters.len() == self.capacity {
            self.letters.pop_front();
        }
        self.letters.push_back(letter);
        self.total += 1;
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.letters.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.letters.is_empty()
    }

    /// Letters recorded since start, including evicted ones.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Retained letters, oldest first.
    #[must_use]
    pub fn snapshot(&self) -> Vec<DeadLetter> {
        self.letters.iter().cloned().collect()
    }
}
