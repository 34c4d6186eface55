//! Per-user event delivery.
//!
//! The transport that frames events onto client connections is an external
//! collaborator; the core only needs a fire-and-forget "deliver to user"
//! primitive. [`DeliveryHub`] is the in-process implementation: the
//! connection layer registers an mpsc sender per user, and the fan-out layer
//! routes payloads to it. Delivery failures are logged and counted, never
//! surfaced to the triggering operation.

use crate::metrics;
use crate::UserId;
use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::mpsc;
use tracing::debug;

/// Per-connection channel capacity before sends start failing.
const MAILBOX_CAPACITY: usize = 256;

/// An event addressed to one user on one logical channel.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    pub channel: String,
    pub payload: serde_json::Value,
}

/// Abstract "send to user" primitive.
///
/// Fire-and-forget: implementations must not block the caller on the
/// recipient and must swallow per-recipient failures.
#[async_trait]
pub trait Delivery: Send + Sync {
    async fn deliver(&self, target: UserId, channel: &str, payload: serde_json::Value);
}

/// In-process delivery hub routing events to per-user mpsc channels.
pub struct DeliveryHub {
    senders: DashMap<UserId, mpsc::Sender<Envelope>>,
}

impl DeliveryHub {
    /// Create an empty hub.
    pub fn new() -> Self {
        Self {
            senders: DashMap::new(),
        }
    }

    /// Register a user's mailbox, returning the receiving end for the
    /// connection task. A newer registration replaces the previous sender.
    pub fn register(&self, user_id: UserId) -> mpsc::Receiver<Envelope> {
        let (tx, rx) = mpsc::channel(MAILBOX_CAPACITY);
        self.senders.insert(user_id, tx);
        rx
    }

    /// Drop a user's mailbox. The connection task sees its receiver close.
    pub fn unregister(&self, user_id: UserId) {
        self.senders.remove(&user_id);
    }

    /// Whether a mailbox is registered for the user.
    pub fn is_registered(&self, user_id: UserId) -> bool {
        self.senders.contains_key(&user_id)
    }
}

impl Default for DeliveryHub {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Delivery for DeliveryHub {
    async fn deliver(&self, target: UserId, channel: &str, payload: serde_json::Value) {
        // Clone the sender out so no shard guard is held across the await.
        let sender = self.senders.get(&target).map(|s| s.clone());

        let Some(sender) = sender else {
            debug!(target = target, channel = %channel, "No mailbox for delivery target");
            metrics::inc_delivery_failures();
            return;
        };

        let envelope = Envelope {
            channel: channel.to_string(),
            payload,
        };

        if sender.send(envelope).await.is_err() {
            debug!(target = target, channel = %channel, "Delivery target mailbox closed");
            metrics::inc_delivery_failures();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_register_deliver_receive() {
        let hub = DeliveryHub::new();
        let mut rx = hub.register(5);

        hub.deliver(5, "status", json!({"ok": true})).await;

        let envelope = rx.recv().await.expect("envelope delivered");
        assert_eq!(envelope.channel, "status");
        assert_eq!(envelope.payload, json!({"ok": true}));
    }

    #[tokio::test]
    async fn test_deliver_to_unregistered_is_swallowed() {
        let hub = DeliveryHub::new();
        // Must not panic or error.
        hub.deliver(99, "status", json!({})).await;
    }

    #[tokio::test]
    async fn test_reregister_replaces_mailbox() {
        let hub = DeliveryHub::new();
        let mut old_rx = hub.register(5);
        let mut new_rx = hub.register(5);

        hub.deliver(5, "typing", json!(1)).await;

        assert!(new_rx.try_recv().is_ok());
        assert!(old_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_unregister() {
        let hub = DeliveryHub::new();
        let mut rx = hub.register(5);
        assert!(hub.is_registered(5));

        hub.unregister(5);
        assert!(!hub.is_registered(5));
        // Receiver observes closure.
        assert!(rx.recv().await.is_none());
    }
}
