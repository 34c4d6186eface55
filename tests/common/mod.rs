//! Integration test common infrastructure.
//!
//! Builds the full core in-process: an in-memory database, the presence and
//! typing registries, the delivery hub, and the services wired the same way
//! the daemon wires them. Tests observe fan-out by registering hub mailboxes.

#![allow(dead_code)]

use amityd::db::Database;
use amityd::delivery::{DeliveryHub, Envelope};
use amityd::services::{
    FriendRequestService, FriendshipService, Notifier, PresenceService, TypingService,
};
use amityd::state::{PresenceRegistry, TypingTracker};
use amityd::UserId;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// A fully wired core over an in-memory database.
pub struct TestApp {
    pub db: Database,
    pub hub: Arc<DeliveryHub>,
    pub presence_registry: Arc<PresenceRegistry>,
    pub typing_tracker: Arc<TypingTracker>,
    pub notifier: Arc<Notifier>,
    pub requests: FriendRequestService,
    pub friendships: FriendshipService,
    pub presence: PresenceService,
    pub typing: Arc<TypingService>,
}

impl TestApp {
    /// Build an app with the production typing TTL (5s).
    pub async fn new() -> Self {
        Self::with_typing_ttl(Duration::from_secs(5)).await
    }

    /// Build an app with a custom typing TTL so expiry tests don't sleep
    /// for production durations.
    pub async fn with_typing_ttl(ttl: Duration) -> Self {
        let db = Database::new(":memory:")
            .await
            .expect("Failed to open in-memory database");

        let hub = Arc::new(DeliveryHub::new());
        let presence_registry = Arc::new(PresenceRegistry::new());
        let typing_tracker = Arc::new(TypingTracker::new(ttl));

        let notifier = Arc::new(Notifier::new(
            db.clone(),
            Arc::clone(&presence_registry),
            hub.clone(),
        ));

        let requests = FriendRequestService::new(db.clone());
        let friendships = FriendshipService::new(db.clone());
        let presence = PresenceService::new(
            db.clone(),
            Arc::clone(&presence_registry),
            Arc::clone(&notifier),
        );
        let typing = Arc::new(TypingService::new(
            Arc::clone(&typing_tracker),
            Arc::clone(&notifier),
        ));

        Self {
            db,
            hub,
            presence_registry,
            typing_tracker,
            notifier,
            requests,
            friendships,
            presence,
            typing,
        }
    }

    /// Insert a user and return their id.
    pub async fn seed_user(&self, username: &str) -> UserId {
        self.db
            .users()
            .create(username)
            .await
            .expect("Failed to seed user")
            .id
    }

    /// Register a delivery mailbox for a user.
    pub fn mailbox(&self, user_id: UserId) -> mpsc::Receiver<Envelope> {
        self.hub.register(user_id)
    }

    /// Establish a friendship through the full request flow.
    pub async fn befriend(&self, a: UserId, b: UserId) {
        let request = self
            .requests
            .send_request(a, b)
            .await
            .expect("send_request failed while befriending");
        self.requests
            .accept_request(request.id, b)
            .await
            .expect("accept_request failed while befriending");
    }
}

/// Receive the next envelope or panic after a short timeout.
pub async fn recv_envelope(rx: &mut mpsc::Receiver<Envelope>) -> Envelope {
    tokio::time::timeout(Duration::from_secs(1), rx.recv())
        .await
        .expect("Timed out waiting for envelope")
        .expect("Mailbox closed")
}

/// Assert no envelope arrives within a short window.
pub async fn assert_no_envelope(rx: &mut mpsc::Receiver<Envelope>) {
    let result = tokio::time::timeout(Duration::from_millis(100), rx.recv()).await;
    assert!(result.is_err(), "Unexpected envelope: {:?}", result);
}
