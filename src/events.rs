//! Event payloads fanned out to clients.
//!
//! The string vocabularies here are externally observable and must not
//! change: presence status `"ONLINE"`/`"OFFLINE"`, friendship status
//! `"FRIENDS"`/`"REQUEST_SENT"`/`"REQUEST_RECEIVED"`/`"NOT_FRIENDS"`.

use crate::UserId;
use serde::Serialize;

/// Logical channel for presence events.
pub const STATUS_CHANNEL: &str = "status";
/// Logical channel for typing-indicator events.
pub const TYPING_CHANNEL: &str = "typing";
/// Logical channel for direct messages.
pub const MESSAGE_CHANNEL: &str = "messages";

/// Whether a user is connected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PresenceState {
    Online,
    Offline,
}

impl PresenceState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Online => "ONLINE",
            Self::Offline => "OFFLINE",
        }
    }
}

/// Relation between two users as seen from one side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FriendshipStatus {
    Friends,
    RequestSent,
    RequestReceived,
    NotFriends,
}

impl FriendshipStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Friends => "FRIENDS",
            Self::RequestSent => "REQUEST_SENT",
            Self::RequestReceived => "REQUEST_RECEIVED",
            Self::NotFriends => "NOT_FRIENDS",
        }
    }
}

/// A friend went online or offline.
///
/// `last_seen` is populated only for OFFLINE events; an online user has no
/// meaningful last-seen yet.
#[derive(Debug, Clone, Serialize)]
pub struct PresenceEvent {
    pub user_id: UserId,
    pub username: String,
    pub status: PresenceState,
    pub last_seen: Option<i64>,
}

/// A user started or stopped typing to a recipient.
#[derive(Debug, Clone, Serialize)]
pub struct TypingEvent {
    pub user_id: UserId,
    pub username: String,
    pub recipient_id: UserId,
    pub typing: bool,
}

/// A direct message with its server-assigned id and timestamp.
#[derive(Debug, Clone, Serialize)]
pub struct MessageEvent {
    pub id: i64,
    pub sender_id: UserId,
    pub recipient_id: UserId,
    pub content: String,
    pub sent_at: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presence_vocabulary() {
        assert_eq!(
            serde_json::to_value(PresenceState::Online).unwrap(),
            serde_json::json!("ONLINE")
        );
        assert_eq!(
            serde_json::to_value(PresenceState::Offline).unwrap(),
            serde_json::json!("OFFLINE")
        );
    }

    #[test]
    fn test_friendship_status_vocabulary() {
        for (status, s) in [
            (FriendshipStatus::Friends, "FRIENDS"),
            (FriendshipStatus::RequestSent, "REQUEST_SENT"),
            (FriendshipStatus::RequestReceived, "REQUEST_RECEIVED"),
            (FriendshipStatus::NotFriends, "NOT_FRIENDS"),
        ] {
            assert_eq!(status.as_str(), s);
            assert_eq!(serde_json::to_value(status).unwrap(), serde_json::json!(s));
        }
    }

    #[test]
    fn test_presence_event_payload_shape() {
        let event = PresenceEvent {
            user_id: 3,
            username: "trinity".to_string(),
            status: PresenceState::Offline,
            last_seen: Some(1_700_000_000),
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["status"], "OFFLINE");
        assert_eq!(value["last_seen"], 1_700_000_000);
    }
}
