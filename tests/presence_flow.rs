//! Integration tests for presence: connect/disconnect fan-out to friends.

mod common;

use common::{assert_no_envelope, recv_envelope, TestApp};

#[tokio::test]
async fn test_connect_notifies_online_friends() {
    let app = TestApp::new().await;
    let user3 = app.seed_user("trinity").await;
    let user4 = app.seed_user("morpheus").await;
    app.befriend(user3, user4).await;

    // Friend 4 is already online with a registered mailbox.
    let mut rx4 = app.mailbox(user4);
    app.presence.connect(user4, "s-morpheus").await;

    let before_connect = chrono::Utc::now().timestamp();
    app.presence.connect(user3, "s1").await;
    assert!(app.presence.is_online(user3));
    assert!(app.presence_registry.online_users().contains(&user3));

    let envelope = recv_envelope(&mut rx4).await;
    assert_eq!(envelope.channel, "status");
    assert_eq!(envelope.payload["user_id"], user3);
    assert_eq!(envelope.payload["username"], "trinity");
    assert_eq!(envelope.payload["status"], "ONLINE");
    assert!(envelope.payload["last_seen"].is_null());

    // Disconnect: friend sees OFFLINE with a non-null last_seen >= connect.
    app.presence.disconnect(user3, "s1").await;
    assert!(!app.presence.is_online(user3));

    let envelope = recv_envelope(&mut rx4).await;
    assert_eq!(envelope.payload["status"], "OFFLINE");
    let last_seen = envelope.payload["last_seen"]
        .as_i64()
        .expect("offline event carries last_seen");
    assert!(last_seen >= before_connect);
}

#[tokio::test]
async fn test_offline_friends_and_strangers_get_nothing() {
    let app = TestApp::new().await;
    let alice = app.seed_user("alice").await;
    let bob = app.seed_user("bob").await;
    let carol = app.seed_user("carol").await;
    app.befriend(alice, bob).await;
    // carol is online but not alice's friend.

    let mut rx_bob = app.mailbox(bob);
    let mut rx_carol = app.mailbox(carol);
    app.presence.connect(carol, "s-carol").await;

    // bob has a mailbox but never connected: the fan-out filters him out.
    app.presence.connect(alice, "s-alice").await;

    assert_no_envelope(&mut rx_bob).await;
    assert_no_envelope(&mut rx_carol).await;
}

#[tokio::test]
async fn test_stale_disconnect_keeps_user_online() {
    let app = TestApp::new().await;
    let alice = app.seed_user("alice").await;
    let bob = app.seed_user("bob").await;
    app.befriend(alice, bob).await;

    let mut rx_bob = app.mailbox(bob);
    app.presence.connect(bob, "s-bob").await;

    app.presence.connect(alice, "old-session").await;
    let online_event = recv_envelope(&mut rx_bob).await;
    assert_eq!(online_event.payload["status"], "ONLINE");

    // Reconnect lands before the old session's disconnect is processed.
    app.presence.connect(alice, "new-session").await;
    let _second_online = recv_envelope(&mut rx_bob).await;

    app.presence.disconnect(alice, "old-session").await;

    // The stale disconnect neither takes alice offline nor emits OFFLINE.
    assert!(app.presence.is_online(alice));
    assert_no_envelope(&mut rx_bob).await;

    // The live session's disconnect works normally.
    app.presence.disconnect(alice, "new-session").await;
    assert!(!app.presence.is_online(alice));
    let offline_event = recv_envelope(&mut rx_bob).await;
    assert_eq!(offline_event.payload["status"], "OFFLINE");
}

#[tokio::test]
async fn test_user_status_snapshot() {
    let app = TestApp::new().await;
    let alice = app.seed_user("alice").await;

    let status = app.presence.user_status(alice).await.unwrap();
    assert_eq!(status.username, "alice");
    assert_eq!(status.status.as_str(), "OFFLINE");
    assert!(status.last_seen.is_none());

    app.presence.connect(alice, "s1").await;
    let status = app.presence.user_status(alice).await.unwrap();
    assert_eq!(status.status.as_str(), "ONLINE");
    // Online users have no meaningful last-seen in the snapshot.
    assert!(status.last_seen.is_none());

    app.presence.disconnect(alice, "s1").await;
    let status = app.presence.user_status(alice).await.unwrap();
    assert_eq!(status.status.as_str(), "OFFLINE");
    assert!(status.last_seen.is_some());

    assert!(matches!(
        app.presence.user_status(9999).await,
        Err(amityd::error::CoreError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_fanout_reaches_all_online_friends() {
    let app = TestApp::new().await;
    let alice = app.seed_user("alice").await;
    let bob = app.seed_user("bob").await;
    let carol = app.seed_user("carol").await;
    let dave = app.seed_user("dave").await;
    app.befriend(alice, bob).await;
    app.befriend(alice, carol).await;
    app.befriend(alice, dave).await;

    let mut rx_bob = app.mailbox(bob);
    let mut rx_carol = app.mailbox(carol);
    app.presence.connect(bob, "s-bob").await;
    app.presence.connect(carol, "s-carol").await;
    // dave stays offline.

    app.presence.connect(alice, "s-alice").await;

    assert_eq!(recv_envelope(&mut rx_bob).await.payload["status"], "ONLINE");
    assert_eq!(
        recv_envelope(&mut rx_carol).await.payload["status"],
        "ONLINE"
    );
}
