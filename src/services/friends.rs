//! Friendship queries and unfriending.

use crate::db::{Database, Friendship, User};
use crate::error::{CoreError, CoreResult};
use crate::events::FriendshipStatus;
use crate::UserId;
use tracing::info;

/// Service for established-friendship operations.
#[derive(Clone)]
pub struct FriendshipService {
    db: Database,
}

impl FriendshipService {
    /// Create the service over a database handle.
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// All friends of a user, as user rows.
    pub async fn friends(&self, user_id: UserId) -> CoreResult<Vec<User>> {
        self.require_user(user_id).await?;
        Ok(self.db.friendships().friends(user_id).await?)
    }

    /// Ids of all friends of a user.
    pub async fn friend_ids(&self, user_id: UserId) -> CoreResult<Vec<UserId>> {
        Ok(self.db.friendships().friend_ids(user_id).await?)
    }

    /// Whether the unordered pair is friends.
    pub async fn are_friends(&self, a: UserId, b: UserId) -> CoreResult<bool> {
        Ok(self.db.friendships().are_friends(a, b).await?)
    }

    /// The friendship row for the pair, if any.
    pub async fn find_friendship(&self, a: UserId, b: UserId) -> CoreResult<Option<Friendship>> {
        Ok(self.db.friendships().find_between(a, b).await?)
    }

    /// Remove the friendship between two users.
    ///
    /// Fails `NotFound` for unknown users and `InvalidState` when they are
    /// not friends; the storage delete itself is a silent no-op, so the
    /// existence pre-check is what produces the distinguishable error.
    pub async fn remove_friend(&self, user_id: UserId, friend_id: UserId) -> CoreResult<()> {
        self.require_user(user_id).await?;
        if !self.db.users().exists(friend_id).await? {
            return Err(CoreError::NotFound(format!(
                "friend not found: {friend_id}"
            )));
        }

        if !self.db.friendships().are_friends(user_id, friend_id).await? {
            return Err(CoreError::InvalidState("users are not friends".to_string()));
        }

        self.db.friendships().delete(user_id, friend_id).await?;
        info!(
            user = user_id,
            friend = friend_id,
            "Friendship removed"
        );
        Ok(())
    }

    /// Users who are friends with both sides of the pair, excluding the
    /// pair themselves.
    pub async fn mutual_friends(&self, a: UserId, b: UserId) -> CoreResult<Vec<User>> {
        Ok(self.db.friendships().mutual_friends(a, b).await?)
    }

    /// Search a user's friends by username substring, case-insensitively.
    /// A blank term returns the full friend list.
    pub async fn search_friends(&self, user_id: UserId, term: &str) -> CoreResult<Vec<User>> {
        let term = term.trim();
        if term.is_empty() {
            return self.friends(user_id).await;
        }
        Ok(self.db.friendships().search_friends(user_id, term).await?)
    }

    /// Number of friends a user has.
    pub async fn friend_count(&self, user_id: UserId) -> CoreResult<i64> {
        Ok(self.db.friendships().count(user_id).await?)
    }

    /// Classify the relation between `current_user_id` and `other_user_id`.
    ///
    /// Friendship wins over any pending request; a pending request is
    /// classified by its direction relative to the current user.
    pub async fn status(
        &self,
        current_user_id: UserId,
        other_user_id: UserId,
    ) -> CoreResult<FriendshipStatus> {
        if self
            .db
            .friendships()
            .are_friends(current_user_id, other_user_id)
            .await?
        {
            return Ok(FriendshipStatus::Friends);
        }

        if let Some(request) = self
            .db
            .requests()
            .find_pending_between(current_user_id, other_user_id)
            .await?
        {
            return Ok(if request.sender_id == current_user_id {
                FriendshipStatus::RequestSent
            } else {
                FriendshipStatus::RequestReceived
            });
        }

        Ok(FriendshipStatus::NotFriends)
    }

    async fn require_user(&self, user_id: UserId) -> CoreResult<()> {
        if !self.db.users().exists(user_id).await? {
            return Err(CoreError::NotFound(format!("user not found: {user_id}")));
        }
        Ok(())
    }
}
