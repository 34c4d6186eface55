//! Friend-request state machine.
//!
//! Governs the request lifecycle against the store: PENDING rows are created
//! by send, resolved by accept/reject, and deleted by cancel. Terminal rows
//! are immutable except for age-based cleanup of REJECTED records.
//!
//! Races are decided by the storage layer: the pending-pair UNIQUE index for
//! duplicate sends, conditional UPDATEs for concurrent resolutions. The
//! pre-checks below exist for the distinguishable error messages, not for
//! correctness.

use crate::db::{Database, FriendRequest, RequestStatus};
use crate::error::{CoreError, CoreResult};
use crate::metrics;
use crate::UserId;
use tracing::info;

/// Service for friend-request lifecycle operations.
#[derive(Clone)]
pub struct FriendRequestService {
    db: Database,
}

impl FriendRequestService {
    /// Create the service over a database handle.
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Send a friend request from `sender_id` to `receiver_id`.
    ///
    /// Fails with `InvalidOperation` on self-requests, `NotFound` for
    /// unknown users, and `Conflict` when the pair is already friends or a
    /// PENDING request already exists in either direction. The conflict
    /// message distinguishes which side sent the existing request. A
    /// concurrent duplicate that slips past the pre-check surfaces as the
    /// same `Conflict`, re-classified from the storage constraint.
    pub async fn send_request(
        &self,
        sender_id: UserId,
        receiver_id: UserId,
    ) -> CoreResult<FriendRequest> {
        if sender_id == receiver_id {
            return Err(CoreError::InvalidOperation(
                "cannot send a friend request to yourself".to_string(),
            ));
        }

        if !self.db.users().exists(sender_id).await? {
            return Err(CoreError::NotFound(format!(
                "sender not found: {sender_id}"
            )));
        }
        if !self.db.users().exists(receiver_id).await? {
            return Err(CoreError::NotFound(format!(
                "receiver not found: {receiver_id}"
            )));
        }

        if self.db.friendships().are_friends(sender_id, receiver_id).await? {
            return Err(CoreError::Conflict("users are already friends".to_string()));
        }

        if let Some(existing) = self
            .db
            .requests()
            .find_pending_between(sender_id, receiver_id)
            .await?
        {
            return Err(if existing.sender_id == receiver_id {
                CoreError::Conflict(
                    "this user has already sent you a friend request; accept it instead"
                        .to_string(),
                )
            } else {
                CoreError::Conflict("friend request already sent and pending".to_string())
            });
        }

        let request = self
            .db
            .requests()
            .insert_pending(sender_id, receiver_id)
            .await?;

        metrics::inc_friend_request("sent");
        info!(
            request_id = request.id,
            sender = sender_id,
            receiver = receiver_id,
            "Friend request sent"
        );
        Ok(request)
    }

    /// Accept a PENDING request as its receiver.
    ///
    /// On success the request becomes ACCEPTED and the friendship edge is
    /// created with canonical ordering, in one transaction. An
    /// already-existing edge does not roll the acceptance back. Of two
    /// concurrent accepts exactly one succeeds; the other fails
    /// `InvalidState`.
    pub async fn accept_request(&self, request_id: i64, acting_user_id: UserId) -> CoreResult<()> {
        let request = self.load_request(request_id).await?;

        if request.receiver_id != acting_user_id {
            return Err(CoreError::Forbidden(
                "only the receiver can accept this request".to_string(),
            ));
        }
        if request.status != RequestStatus::Pending {
            return Err(CoreError::InvalidState(format!(
                "request is not pending (current status: {})",
                request.status
            )));
        }

        let accepted = self
            .db
            .requests()
            .mark_accepted_and_create_friendship(&request)
            .await?;
        if !accepted {
            return Err(CoreError::InvalidState(
                "request was already resolved".to_string(),
            ));
        }

        metrics::inc_friend_request("accepted");
        info!(
            request_id = request_id,
            sender = request.sender_id,
            receiver = request.receiver_id,
            "Friend request accepted, friendship created"
        );
        Ok(())
    }

    /// Reject a PENDING request as its receiver.
    pub async fn reject_request(&self, request_id: i64, acting_user_id: UserId) -> CoreResult<()> {
        let request = self.load_request(request_id).await?;

        if request.receiver_id != acting_user_id {
            return Err(CoreError::Forbidden(
                "only the receiver can reject this request".to_string(),
            ));
        }
        if request.status != RequestStatus::Pending {
            return Err(CoreError::InvalidState(format!(
                "request is not pending (current status: {})",
                request.status
            )));
        }

        if !self.db.requests().mark_rejected(request_id).await? {
            return Err(CoreError::InvalidState(
                "request was already resolved".to_string(),
            ));
        }

        metrics::inc_friend_request("rejected");
        info!(
            request_id = request_id,
            rejected_by = acting_user_id,
            "Friend request rejected"
        );
        Ok(())
    }

    /// Cancel a still-PENDING request as its sender. The record is deleted
    /// entirely; no terminal state is retained.
    pub async fn cancel_request(&self, request_id: i64, acting_user_id: UserId) -> CoreResult<()> {
        let request = self.load_request(request_id).await?;

        if request.sender_id != acting_user_id {
            return Err(CoreError::Forbidden(
                "only the sender can cancel this request".to_string(),
            ));
        }
        if request.status != RequestStatus::Pending {
            return Err(CoreError::InvalidState(
                "cannot cancel a request that is not pending".to_string(),
            ));
        }

        if !self.db.requests().delete_pending(request_id).await? {
            return Err(CoreError::InvalidState(
                "request was already resolved".to_string(),
            ));
        }

        metrics::inc_friend_request("cancelled");
        info!(
            request_id = request_id,
            cancelled_by = acting_user_id,
            "Friend request cancelled"
        );
        Ok(())
    }

    /// PENDING requests received by a user.
    pub async fn pending_received(&self, user_id: UserId) -> CoreResult<Vec<FriendRequest>> {
        Ok(self.db.requests().pending_received(user_id).await?)
    }

    /// PENDING requests sent by a user.
    pub async fn pending_sent(&self, user_id: UserId) -> CoreResult<Vec<FriendRequest>> {
        Ok(self.db.requests().pending_sent(user_id).await?)
    }

    /// Count of PENDING requests received by a user.
    pub async fn count_pending_received(&self, user_id: UserId) -> CoreResult<i64> {
        Ok(self.db.requests().count_pending_received(user_id).await?)
    }

    /// Delete REJECTED requests older than `max_age_days`. Idempotent;
    /// returns the number of rows removed.
    pub async fn cleanup_old_rejected(&self, max_age_days: i64) -> CoreResult<u64> {
        let cutoff = chrono::Utc::now().timestamp() - max_age_days * 86400;
        let removed = self.db.requests().delete_old_rejected(cutoff).await?;
        if removed > 0 {
            info!(
                removed = removed,
                max_age_days = max_age_days,
                "Old rejected friend requests cleaned up"
            );
        }
        Ok(removed)
    }

    async fn load_request(&self, request_id: i64) -> CoreResult<FriendRequest> {
        self.db
            .requests()
            .find_by_id(request_id)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("friend request not found: {request_id}")))
    }
}
