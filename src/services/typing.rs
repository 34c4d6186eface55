//! Typing-indicator service and expiry sweep task.

use crate::metrics;
use crate::services::Notifier;
use crate::state::TypingTracker;
use crate::UserId;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Service wrapping the typing tracker with notifications.
pub struct TypingService {
    tracker: Arc<TypingTracker>,
    notifier: Arc<Notifier>,
}

impl TypingService {
    /// Create the service over the shared tracker and notifier.
    pub fn new(tracker: Arc<TypingTracker>, notifier: Arc<Notifier>) -> Self {
        Self { tracker, notifier }
    }

    /// Record that a user started typing and tell the recipient.
    ///
    /// Every call re-emits the ACTIVE=true event even when the entry already
    /// existed; clients rely on the repeats to keep their indicator timer
    /// alive.
    pub async fn start_typing(&self, user_id: UserId, recipient_id: UserId) {
        self.tracker.start(user_id, recipient_id);
        metrics::set_typing_active(self.tracker.active_count() as i64);
        debug!(
            user_id = user_id,
            recipient = recipient_id,
            "User started typing"
        );

        self.notifier
            .notify_typing(user_id, recipient_id, true)
            .await;
    }

    /// Record that a user stopped typing and tell the recipient.
    ///
    /// Idempotent: the ACTIVE=false event is emitted whether or not an entry
    /// existed.
    pub async fn stop_typing(&self, user_id: UserId, recipient_id: UserId) {
        self.tracker.stop(user_id, recipient_id);
        metrics::set_typing_active(self.tracker.active_count() as i64);
        debug!(
            user_id = user_id,
            recipient = recipient_id,
            "User stopped typing"
        );

        self.notifier
            .notify_typing(user_id, recipient_id, false)
            .await;
    }

    /// Whether the pair has an unexpired typing entry.
    pub fn is_typing(&self, user_id: UserId, recipient_id: UserId) -> bool {
        self.tracker.is_typing(user_id, recipient_id)
    }

    /// Run one expiry sweep, emitting ACTIVE=false for each removed pair as
    /// if the typist had called [`Self::stop_typing`].
    pub async fn sweep_expired(&self) {
        let expired = self.tracker.sweep_expired();
        if expired.is_empty() {
            return;
        }

        for (typist_id, recipient_id) in expired {
            debug!(
                user_id = typist_id,
                recipient = recipient_id,
                "Typing indicator expired"
            );
            self.notifier
                .notify_typing(typist_id, recipient_id, false)
                .await;
        }
        metrics::set_typing_active(self.tracker.active_count() as i64);
    }
}

/// Spawn the typing-expiry sweep background task.
///
/// Runs [`TypingService::sweep_expired`] on a fixed period. Independent of
/// the stale-request cleanup task; their periods and failure-isolation needs
/// differ by orders of magnitude.
pub fn spawn_typing_sweep_task(service: Arc<TypingService>, period: Duration) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);

        loop {
            interval.tick().await;
            service.sweep_expired().await;
        }
    });
}
