//! Time-bounded typing-indicator tracker.
//!
//! One entry per (typist, recipient) pair, refreshed on every keystroke
//! burst and dropped on explicit stop or TTL expiry. The periodic sweep is
//! the only place state changes without a direct caller action.

use crate::UserId;
use dashmap::DashMap;
use std::time::{Duration, Instant};

/// Concurrent registry of active typing indicators.
pub struct TypingTracker {
    entries: DashMap<(UserId, UserId), Instant>,
    ttl: Duration,
}

impl TypingTracker {
    /// Create a tracker whose entries expire `ttl` after their last refresh.
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    /// Record that `user_id` started (or is still) typing to `recipient_id`.
    /// Refreshes the expiry deadline on every call.
    pub fn start(&self, user_id: UserId, recipient_id: UserId) {
        self.entries
            .insert((user_id, recipient_id), Instant::now() + self.ttl);
    }

    /// Remove the entry for the pair, if present. Returns whether an entry
    /// existed; callers emit their stop event regardless.
    pub fn stop(&self, user_id: UserId, recipient_id: UserId) -> bool {
        self.entries.remove(&(user_id, recipient_id)).is_some()
    }

    /// Whether the pair has an unexpired entry. Lazy check only: an expired
    /// entry is reported as not typing but left for the sweep to remove.
    pub fn is_typing(&self, user_id: UserId, recipient_id: UserId) -> bool {
        self.entries
            .get(&(user_id, recipient_id))
            .is_some_and(|deadline| *deadline > Instant::now())
    }

    /// Remove every expired entry and return the pairs that were removed.
    ///
    /// Keys are snapshotted first, then each removal re-checks expiry inside
    /// `remove_if`: a refresh that lands between the snapshot and the
    /// removal moves the deadline forward and the entry survives.
    pub fn sweep_expired(&self) -> Vec<(UserId, UserId)> {
        let now = Instant::now();

        let candidates: Vec<(UserId, UserId)> = self
            .entries
            .iter()
            .filter(|entry| *entry.value() <= now)
            .map(|entry| *entry.key())
            .collect();

        candidates
            .into_iter()
            .filter(|key| {
                self.entries
                    .remove_if(key, |_, deadline| *deadline <= now)
                    .is_some()
            })
            .collect()
    }

    /// Number of live entries (including any not yet swept).
    pub fn active_count(&self) -> usize {
        self.entries.len()
    }
}
