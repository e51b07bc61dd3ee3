//! History ring: bounded per-host log of probe outcomes.
//!
//! One entry per sent echo request, oldest first. When full, the oldest
//! entry is evicted before the new one goes in, so memory stays flat no
//! matter how long the dashboard runs. Replies are correlated by
//! sequence number; a reply for an entry that has already been evicted
//! is dropped on the floor.

use std::collections::VecDeque;

use thiserror::Error;

/// ICMP echo sequence number (16-bit on the wire, wraps).
pub type Sequence = u16;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum HistoryError {
    #[error("history capacity must be greater than zero")]
    ZeroCapacity,
}

/// One sent probe and whether its reply has come back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryEntry {
    pub seq: Sequence,
    pub received: bool,
}

impl HistoryEntry {
    /// A probe that has just been sent.
    pub fn pending(seq: Sequence) -> Self {
        Self {
            seq,
            received: false,
        }
    }
}

/// Fixed-capacity FIFO of [`HistoryEntry`] values.
#[derive(Debug, Clone)]
pub struct HistoryRing {
    entries: VecDeque<HistoryEntry>,
    capacity: usize,
}

impl HistoryRing {
    pub fn new(capacity: usize) -> Result<Self, HistoryError> {
        if capacity == 0 {
            return Err(HistoryError::ZeroCapacity);
        }
        Ok(Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        })
    }

    /// Append at the newest position, evicting the oldest entry if full.
    pub fn append(&mut self, entry: HistoryEntry) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    /// Mark the retained entry for `seq` as received.
    ///
    /// No-op when `seq` is not in the ring (late reply, already evicted).
    pub fn mark_received(&mut self, seq: Sequence) {
        if let Some(entry) = self.entries.iter_mut().rev().find(|e| e.seq == seq) {
            entry.received = true;
        }
    }

    /// Outcome of the most recently appended entry, `None` if empty.
    pub fn latest_outcome(&self) -> Option<bool> {
        self.entries.back().map(|e| e.received)
    }

    /// Outcome at `index` (0 = oldest), `None` when out of range.
    pub fn outcome_at(&self, index: usize) -> Option<bool> {
        self.entries.get(index).map(|e| e.received)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Entries oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }
}
