//! Notification fan-out.
//!
//! Turns state changes into events on per-user delivery channels. Presence
//! changes go to the user's currently-online friends; typing changes to one
//! recipient; direct messages to the recipient plus an echo to the sender.
//!
//! Nothing here is allowed to fail the triggering operation: storage and
//! lookup failures are logged and swallowed, and each recipient's delivery
//! is attempted independently.

use crate::db::Database;
use crate::delivery::Delivery;
use crate::events::{
    MessageEvent, PresenceEvent, PresenceState, TypingEvent, MESSAGE_CHANNEL, STATUS_CHANNEL,
    TYPING_CHANNEL,
};
use crate::metrics;
use crate::state::PresenceRegistry;
use crate::UserId;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info};

/// Fan-out engine for presence, typing, and message events.
pub struct Notifier {
    db: Database,
    presence: Arc<PresenceRegistry>,
    delivery: Arc<dyn Delivery>,
    /// Server-assigned message ids, process-local and monotonic.
    next_message_id: AtomicI64,
}

impl Notifier {
    /// Create a notifier over the given store, presence registry, and
    /// delivery primitive.
    pub fn new(
        db: Database,
        presence: Arc<PresenceRegistry>,
        delivery: Arc<dyn Delivery>,
    ) -> Self {
        Self {
            db,
            presence,
            delivery,
            next_message_id: AtomicI64::new(1),
        }
    }

    /// Notify a user's online friends that the user went online or offline.
    ///
    /// `last_seen` should carry the refreshed timestamp for OFFLINE events
    /// and `None` for ONLINE. Failures never propagate to the caller: a
    /// connect must succeed even if nobody can be told about it.
    pub async fn notify_friends_of_presence(
        &self,
        user_id: UserId,
        status: PresenceState,
        last_seen: Option<i64>,
    ) {
        let friend_ids = match self.db.friendships().friend_ids(user_id).await {
            Ok(ids) => ids,
            Err(e) => {
                error!(user_id = user_id, error = %e, "Failed to load friend set for presence fan-out");
                return;
            }
        };

        let Some(username) = self.lookup_username(user_id).await else {
            return;
        };

        let event = PresenceEvent {
            user_id,
            username,
            status,
            last_seen,
        };
        let payload = match serde_json::to_value(&event) {
            Ok(v) => v,
            Err(e) => {
                error!(error = %e, "Failed to serialize presence event");
                return;
            }
        };

        // Each delivery is isolated: one dead recipient must not starve the
        // rest of the friend set.
        let mut delivered = 0usize;
        for friend_id in friend_ids {
            if !self.presence.is_online(friend_id) {
                continue;
            }
            self.delivery
                .deliver(friend_id, STATUS_CHANNEL, payload.clone())
                .await;
            delivered += 1;
        }

        metrics::inc_presence_event(status.as_str());
        metrics::observe_fanout(delivered);
        info!(
            user_id = user_id,
            status = %status.as_str(),
            recipients = delivered,
            "Presence fan-out complete"
        );
    }

    /// Notify one recipient that a user started or stopped typing to them.
    /// The actor is deliberately not notified.
    pub async fn notify_typing(&self, typist_id: UserId, recipient_id: UserId, typing: bool) {
        let Some(username) = self.lookup_username(typist_id).await else {
            return;
        };

        let event = TypingEvent {
            user_id: typist_id,
            username,
            recipient_id,
            typing,
        };
        let payload = match serde_json::to_value(&event) {
            Ok(v) => v,
            Err(e) => {
                error!(error = %e, "Failed to serialize typing event");
                return;
            }
        };

        self.delivery
            .deliver(recipient_id, TYPING_CHANNEL, payload)
            .await;
        debug!(
            typist = typist_id,
            recipient = recipient_id,
            typing = typing,
            "Typing event delivered"
        );
    }

    /// Deliver a direct message to the recipient and echo it back to the
    /// sender's own channel.
    ///
    /// The echo is deliberate: the sender's client confirms receipt by
    /// seeing its own message come back with the server-assigned id and
    /// timestamp. Returns the event as assigned.
    pub async fn deliver_message(
        &self,
        sender_id: UserId,
        recipient_id: UserId,
        content: &str,
    ) -> MessageEvent {
        let event = MessageEvent {
            id: self.next_message_id.fetch_add(1, Ordering::Relaxed),
            sender_id,
            recipient_id,
            content: content.to_string(),
            sent_at: chrono::Utc::now().timestamp(),
        };

        match serde_json::to_value(&event) {
            Ok(payload) => {
                self.delivery
                    .deliver(recipient_id, MESSAGE_CHANNEL, payload.clone())
                    .await;
                self.delivery
                    .deliver(sender_id, MESSAGE_CHANNEL, payload)
                    .await;
            }
            Err(e) => {
                error!(error = %e, "Failed to serialize message event");
            }
        }

        event
    }

    async fn lookup_username(&self, user_id: UserId) -> Option<String> {
        match self.db.users().find_by_id(user_id).await {
            Ok(Some(user)) => Some(user.username),
            Ok(None) => {
                debug!(user_id = user_id, "Unknown user in fan-out, dropping event");
                None
            }
            Err(e) => {
                error!(user_id = user_id, error = %e, "Failed to resolve username for fan-out");
                None
            }
        }
    }
}
