use std::{collections::HashMap, hash::Hash};

/// Handed out when a fetch starts; presented again when it completes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Ticket<K> {
    key: K,
    seq: u64,
}

impl<K: Copy> Ticket<K> {
    pub fn key(&self) -> K {
        self.key
    }
}

/// Discards fetch results that were overtaken by a newer fetch for the
/// same entity. No cancellation: the stale request simply runs to completion
/// and its result is dropped.
#[derive(Debug)]
pub struct LatestOnly<K: Eq + Hash> {
    next_seq: u64,
    latest: HashMap<K, u64>,
}

impl<K: Eq + Hash> Default for LatestOnly<K> {
    fn default() -> Self {
        Self {
            next_seq: 0,
            latest: HashMap::new(),
        }
    }
}

impl<K: Eq + Hash + Copy + std::fmt::Debug> LatestOnly<K> {
    pub fn start(&mut self, key: K) -> Ticket<K> {
        self.next_seq += 1;
        self.latest.insert(key, self.next_seq);
        Ticket {
            key,
            seq: self.next_seq,
        }
    }

    pub fn is_current(&self, ticket: &Ticket<K>) -> bool {
        self.latest.get(&ticket.key) == Some(&ticket.seq)
    }

    /// `Some(value)` only when `ticket` is still the newest for its key.
    pub fn accept<T>(&self, ticket: &Ticket<K>, value: T) -> Option<T> {
        if self.is_current(ticket) {
            Some(value)
        } else {
            tracing::warn!(key = ?ticket.key, "discarding stale fetch result");
            None
        }
    }
}
