//! Online-user registry.
//!
//! Tracks which users currently hold a connection and when each user was
//! last seen. Sits on the hot path of every connect/disconnect, so all
//! operations touch only DashMap shards; per-user linearizability comes from
//! per-key atomic operations, never a global lock.

use crate::UserId;
use dashmap::DashMap;

/// Concurrent registry of connected users.
///
/// `sessions` maps a user to their current opaque session token (last writer
/// wins); `last_seen` is refreshed on both connect and disconnect and
/// retained after disconnect.
pub struct PresenceRegistry {
    sessions: DashMap<UserId, String>,
    last_seen: DashMap<UserId, i64>,
}

impl PresenceRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
            last_seen: DashMap::new(),
        }
    }

    /// Record a connection: upsert the session mapping and refresh last-seen.
    pub fn connect(&self, user_id: UserId, session_token: &str) {
        self.sessions.insert(user_id, session_token.to_string());
        self.last_seen.insert(user_id, chrono::Utc::now().timestamp());
    }

    /// Record a disconnection for a specific session.
    ///
    /// The mapping is removed only if the stored token still matches, as a
    /// single atomic per-key operation. A stale disconnect racing a newer
    /// connect for the same user therefore cannot take that user offline:
    /// the newer token doesn't match and the removal is skipped.
    ///
    /// Returns whether the session was actually removed. Last-seen is
    /// refreshed either way.
    pub fn disconnect(&self, user_id: UserId, session_token: &str) -> bool {
        let removed = self
            .sessions
            .remove_if(&user_id, |_, current| current.as_str() == session_token)
            .is_some();
        self.last_seen.insert(user_id, chrono::Utc::now().timestamp());
        removed
    }

    /// Whether the user currently holds a session.
    pub fn is_online(&self, user_id: UserId) -> bool {
        self.sessions.contains_key(&user_id)
    }

    /// Unix timestamp of the user's last connect/disconnect, if ever seen.
    pub fn last_seen(&self, user_id: UserId) -> Option<i64> {
        self.last_seen.get(&user_id).map(|ts| *ts)
    }

    /// Snapshot of all currently online user ids.
    pub fn online_users(&self) -> Vec<UserId> {
        self.sessions.iter().map(|entry| *entry.key()).collect()
    }

    /// Number of currently online users.
    pub fn online_count(&self) -> usize {
        self.sessions.len()
    }
}

impl Default for PresenceRegistry {
    fn default() -> Self {
        Self::new()
    }
}
