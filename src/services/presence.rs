//! Presence service: connection lifecycle plus friend fan-out.

use crate::db::Database;
use crate::error::{CoreError, CoreResult};
use crate::events::PresenceState;
use crate::metrics;
use crate::services::Notifier;
use crate::state::PresenceRegistry;
use crate::UserId;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

/// Point-in-time presence snapshot for one user.
///
/// `last_seen` is populated only when the user is offline.
#[derive(Debug, Clone, Serialize)]
pub struct UserStatusView {
    pub user_id: UserId,
    pub username: String,
    pub status: PresenceState,
    pub last_seen: Option<i64>,
}

/// Service wrapping the presence registry with notifications.
pub struct PresenceService {
    db: Database,
    registry: Arc<PresenceRegistry>,
    notifier: Arc<Notifier>,
}

impl PresenceService {
    /// Create the service over the shared registry and notifier.
    pub fn new(db: Database, registry: Arc<PresenceRegistry>, notifier: Arc<Notifier>) -> Self {
        Self {
            db,
            registry,
            notifier,
        }
    }

    /// Mark a user online under the given session and tell their online
    /// friends. Connecting never fails on fan-out problems.
    pub async fn connect(&self, user_id: UserId, session_token: &str) {
        self.registry.connect(user_id, session_token);
        metrics::set_connected_users(self.registry.online_count() as i64);
        info!(user_id = user_id, session = %session_token, "User connected");

        self.notifier
            .notify_friends_of_presence(user_id, PresenceState::Online, None)
            .await;
    }

    /// Mark a user offline if `session_token` is still their live session,
    /// and tell their online friends, carrying the refreshed last-seen.
    ///
    /// A stale disconnect (the user already reconnected under a newer
    /// session) updates last-seen but emits nothing: the user never appeared
    /// offline.
    pub async fn disconnect(&self, user_id: UserId, session_token: &str) {
        let removed = self.registry.disconnect(user_id, session_token);
        metrics::set_connected_users(self.registry.online_count() as i64);

        if !removed {
            debug!(
                user_id = user_id,
                session = %session_token,
                "Stale disconnect ignored, user has a newer session"
            );
            return;
        }

        info!(user_id = user_id, session = %session_token, "User disconnected");
        let last_seen = self.registry.last_seen(user_id);
        self.notifier
            .notify_friends_of_presence(user_id, PresenceState::Offline, last_seen)
            .await;
    }

    /// Whether the user currently holds a session.
    pub fn is_online(&self, user_id: UserId) -> bool {
        self.registry.is_online(user_id)
    }

    /// Unix timestamp of the user's last connect/disconnect, if ever seen.
    pub fn last_seen(&self, user_id: UserId) -> Option<i64> {
        self.registry.last_seen(user_id)
    }

    /// Snapshot of all currently online user ids.
    pub fn online_users(&self) -> Vec<UserId> {
        self.registry.online_users()
    }

    /// Presence snapshot for one user, with username resolved from the
    /// directory.
    pub async fn user_status(&self, user_id: UserId) -> CoreResult<UserStatusView> {
        let user = self
            .db
            .users()
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("user not found: {user_id}")))?;

        let online = self.registry.is_online(user_id);
        Ok(UserStatusView {
            user_id,
            username: user.username,
            status: if online {
                PresenceState::Online
            } else {
                PresenceState::Offline
            },
            last_seen: if online {
                None
            } else {
                self.registry.last_seen(user_id)
            },
        })
    }
}
