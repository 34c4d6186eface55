//! Friend-request repository.
//!
//! Requests are directional rows with a three-state lifecycle. The partial
//! UNIQUE index over the canonicalized pair (see the migration) is the
//! authority for "at most one PENDING request per pair"; every status
//! transition is a conditional UPDATE whose `rows_affected` decides races.

use super::DbError;
use crate::UserId;
use sqlx::SqlitePool;
use tracing::warn;

/// Lifecycle state of a friend request.
///
/// Stored and exposed as the stable strings `"PENDING"`, `"ACCEPTED"`,
/// `"REJECTED"`. Cancellation deletes the row instead of storing a state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestStatus {
    Pending,
    Accepted,
    Rejected,
}

impl RequestStatus {
    /// Wire/storage form of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Accepted => "ACCEPTED",
            Self::Rejected => "REJECTED",
        }
    }

    fn parse(s: &str) -> Result<Self, DbError> {
        match s {
            "PENDING" => Ok(Self::Pending),
            "ACCEPTED" => Ok(Self::Accepted),
            "REJECTED" => Ok(Self::Rejected),
            other => Err(DbError::Sqlx(sqlx::Error::Decode(
                format!("unknown friend request status: {other}").into(),
            ))),
        }
    }
}

impl std::fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A friend request row.
#[derive(Debug, Clone)]
pub struct FriendRequest {
    pub id: i64,
    pub sender_id: UserId,
    pub receiver_id: UserId,
    pub status: RequestStatus,
    pub created_at: i64,
    pub updated_at: i64,
}

type RequestRow = (i64, i64, i64, String, i64, i64);

fn row_to_request(row: RequestRow) -> Result<FriendRequest, DbError> {
    let (id, sender_id, receiver_id, status, created_at, updated_at) = row;
    Ok(FriendRequest {
        id,
        sender_id,
        receiver_id,
        status: RequestStatus::parse(&status)?,
        created_at,
        updated_at,
    })
}

const REQUEST_COLUMNS: &str = "id, sender_id, receiver_id, status, created_at, updated_at";

/// Repository for friend-request rows.
pub struct FriendRequestRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> FriendRequestRepository<'a> {
    /// Create a new friend-request repository.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a new PENDING request.
    ///
    /// A violation of the pending-pair UNIQUE index (a concurrent duplicate
    /// send that slipped past the caller's pre-checks) maps to
    /// [`DbError::PendingRequestExists`].
    pub async fn insert_pending(
        &self,
        sender_id: UserId,
        receiver_id: UserId,
    ) -> Result<FriendRequest, DbError> {
        let now = chrono::Utc::now().timestamp();

        let result = sqlx::query(
            r#"
            INSERT INTO friend_requests (sender_id, receiver_id, status, created_at, updated_at)
            VALUES (?, ?, 'PENDING', ?, ?)
            "#,
        )
        .bind(sender_id)
        .bind(receiver_id)
        .bind(now)
        .bind(now)
        .execute(self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return DbError::PendingRequestExists;
            }
            DbError::from(e)
        })?;

        Ok(FriendRequest {
            id: result.last_insert_rowid(),
            sender_id,
            receiver_id,
            status: RequestStatus::Pending,
            created_at: now,
            updated_at: now,
        })
    }

    /// Find request by id.
    pub async fn find_by_id(&self, id: i64) -> Result<Option<FriendRequest>, DbError> {
        let row = sqlx::query_as::<_, RequestRow>(&format!(
            "SELECT {REQUEST_COLUMNS} FROM friend_requests WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(row_to_request).transpose()
    }

    /// Find the PENDING request between two users, in either direction.
    pub async fn find_pending_between(
        &self,
        a: UserId,
        b: UserId,
    ) -> Result<Option<FriendRequest>, DbError> {
        let row = sqlx::query_as::<_, RequestRow>(&format!(
            r#"
            SELECT {REQUEST_COLUMNS} FROM friend_requests
            WHERE ((sender_id = ? AND receiver_id = ?)
                OR (sender_id = ? AND receiver_id = ?))
              AND status = 'PENDING'
            "#
        ))
        .bind(a)
        .bind(b)
        .bind(b)
        .bind(a)
        .fetch_optional(self.pool)
        .await?;

        row.map(row_to_request).transpose()
    }

    /// Mark a request ACCEPTED and create the corresponding friendship, in
    /// one explicit transaction.
    ///
    /// The conditional UPDATE (`WHERE status = 'PENDING'`) is the
    /// linearization point: of two concurrent accepts exactly one sees
    /// `rows_affected == 1`. Returns `false` when the request was already
    /// resolved.
    ///
    /// A friendship UNIQUE violation (the edge already exists through another
    /// acceptance path) is logged and swallowed; the acceptance still
    /// commits. This asymmetry is deliberate: the request's terminal state
    /// must not be rolled back because the edge it implies is already there.
    pub async fn mark_accepted_and_create_friendship(
        &self,
        request: &FriendRequest,
    ) -> Result<bool, DbError> {
        let now = chrono::Utc::now().timestamp();
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            r#"
            UPDATE friend_requests
            SET status = 'ACCEPTED', updated_at = ?
            WHERE id = ? AND status = 'PENDING'
            "#,
        )
        .bind(now)
        .bind(request.id)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        let (user1, user2) = super::friendships::canonical_pair(request.sender_id, request.receiver_id);
        let inserted = sqlx::query(
            r#"
            INSERT INTO friendships (user1_id, user2_id, created_at)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(user1)
        .bind(user2)
        .bind(now)
        .execute(&mut *tx)
        .await;

        if let Err(e) = inserted {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                warn!(
                    user1 = user1,
                    user2 = user2,
                    request_id = request.id,
                    "Friendship already exists, keeping acceptance"
                );
            } else {
                return Err(DbError::from(e));
            }
        }

        tx.commit().await?;
        Ok(true)
    }

    /// Mark a request REJECTED. Returns `false` when the request was not
    /// PENDING anymore.
    pub async fn mark_rejected(&self, id: i64) -> Result<bool, DbError> {
        let now = chrono::Utc::now().timestamp();
        let result = sqlx::query(
            r#"
            UPDATE friend_requests
            SET status = 'REJECTED', updated_at = ?
            WHERE id = ? AND status = 'PENDING'
            "#,
        )
        .bind(now)
        .bind(id)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete a still-PENDING request (cancellation). Returns `false` when
    /// the request was not PENDING anymore.
    pub async fn delete_pending(&self, id: i64) -> Result<bool, DbError> {
        let result = sqlx::query(
            r#"
            DELETE FROM friend_requests
            WHERE id = ? AND status = 'PENDING'
            "#,
        )
        .bind(id)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// All PENDING requests received by a user.
    pub async fn pending_received(&self, user_id: UserId) -> Result<Vec<FriendRequest>, DbError> {
        let rows = sqlx::query_as::<_, RequestRow>(&format!(
            r#"
            SELECT {REQUEST_COLUMNS} FROM friend_requests
            WHERE receiver_id = ? AND status = 'PENDING'
            ORDER BY created_at
            "#
        ))
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(row_to_request).collect()
    }

    /// All PENDING requests sent by a user.
    pub async fn pending_sent(&self, user_id: UserId) -> Result<Vec<FriendRequest>, DbError> {
        let rows = sqlx::query_as::<_, RequestRow>(&format!(
            r#"
            SELECT {REQUEST_COLUMNS} FROM friend_requests
            WHERE sender_id = ? AND status = 'PENDING'
            ORDER BY created_at
            "#
        ))
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(row_to_request).collect()
    }

    /// Count PENDING requests received by a user.
    pub async fn count_pending_received(&self, user_id: UserId) -> Result<i64, DbError> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM friend_requests
            WHERE receiver_id = ? AND status = 'PENDING'
            "#,
        )
        .bind(user_id)
        .fetch_one(self.pool)
        .await?;

        Ok(count)
    }

    /// Batch-delete REJECTED requests last touched before the cutoff.
    /// Idempotent storage hygiene; returns the number of rows removed.
    pub async fn delete_old_rejected(&self, cutoff: i64) -> Result<u64, DbError> {
        let result = sqlx::query(
            r#"
            DELETE FROM friend_requests
            WHERE status = 'REJECTED' AND updated_at < ?
            "#,
        )
        .bind(cutoff)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trip() {
        for status in [
            RequestStatus::Pending,
            RequestStatus::Accepted,
            RequestStatus::Rejected,
        ] {
            assert_eq!(RequestStatus::parse(status.as_str()).unwrap(), status);
        }
        assert!(RequestStatus::parse("CANCELLED").is_err());
    }

    #[test]
    fn test_status_wire_strings() {
        assert_eq!(RequestStatus::Pending.as_str(), "PENDING");
        assert_eq!(RequestStatus::Accepted.as_str(), "ACCEPTED");
        assert_eq!(RequestStatus::Rejected.as_str(), "REJECTED");
    }
}
