// Bounded history of write-attempt sizes, used to detect a stalled socket
use std::collections::VecDeque;

/// Sliding window over the byte counts of the most recent write attempts.
/// Scoped to a single write call; never persisted across calls.
pub struct WriteHistory {
    limit: usize,
    entries: VecDeque<usize>,
}

impl WriteHistory {
    pub fn new(limit: usize) -> Self {
        WriteHistory {
            limit,
            entries: VecDeque::with_capacity(limit),
        }
    }

    /// Record one write attempt, evicting the oldest entry once the
    /// window is full.
    pub fn log(&mut self, written: usize) {
        if self.entries.len() == self.limit {
            self.entries.pop_front();
        }
        self.entries.push_back(written);
    }

    pub fn is_full(&self) -> bool {
        self.entries.len() >= self.limit
    }

    pub fn has_writes(&self) -> bool {
        self.entries.iter().any(|&written| written > 0)
    }

    /// The stall predicate: a full window where every attempt wrote nothing.
    pub fn is_full_with_no_writes(&self) -> bool {
        self.is_full() && !self.has_writes()
    }
}
