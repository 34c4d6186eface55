//! Integration tests for direct-message delivery and the echo-to-self
//! contract.

mod common;

use common::{recv_envelope, TestApp};

#[tokio::test]
async fn test_message_delivered_and_echoed() {
    let app = TestApp::new().await;
    let alice = app.seed_user("alice").await;
    let bob = app.seed_user("bob").await;

    let mut rx_alice = app.mailbox(alice);
    let mut rx_bob = app.mailbox(bob);

    let before = chrono::Utc::now().timestamp();
    let event = app.notifier.deliver_message(alice, bob, "hello bob").await;
    assert!(event.id >= 1);
    assert!(event.sent_at >= before);

    // Recipient copy.
    let to_bob = recv_envelope(&mut rx_bob).await;
    assert_eq!(to_bob.channel, "messages");
    assert_eq!(to_bob.payload["sender_id"], alice);
    assert_eq!(to_bob.payload["recipient_id"], bob);
    assert_eq!(to_bob.payload["content"], "hello bob");
    assert_eq!(to_bob.payload["id"], event.id);

    // Echo to the sender carries the same server-assigned id and timestamp.
    let echo = recv_envelope(&mut rx_alice).await;
    assert_eq!(echo.payload, to_bob.payload);
}

#[tokio::test]
async fn test_message_ids_are_monotonic() {
    let app = TestApp::new().await;
    let alice = app.seed_user("alice").await;
    let bob = app.seed_user("bob").await;

    let first = app.notifier.deliver_message(alice, bob, "one").await;
    let second = app.notifier.deliver_message(bob, alice, "two").await;
    assert!(second.id > first.id);
}

#[tokio::test]
async fn test_unreachable_recipient_does_not_break_echo() {
    let app = TestApp::new().await;
    let alice = app.seed_user("alice").await;
    let bob = app.seed_user("bob").await;

    // bob has no mailbox at all; delivery to him is dropped silently.
    let mut rx_alice = app.mailbox(alice);

    let event = app.notifier.deliver_message(alice, bob, "anyone there?").await;

    let echo = recv_envelope(&mut rx_alice).await;
    assert_eq!(echo.payload["id"], event.id);
    assert_eq!(echo.payload["content"], "anyone there?");
}
