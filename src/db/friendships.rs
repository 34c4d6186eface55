//! Friendship repository.
//!
//! Friendships are undirected edges stored once per unordered pair, with the
//! smaller user id always in `user1_id`. Ordering is canonicalized here on
//! insert; lookups still match both columns because callers pass the pair in
//! arbitrary order.

use super::users::User;
use super::DbError;
use crate::UserId;
use sqlx::SqlitePool;

/// A friendship edge. Invariant: `user1_id < user2_id`.
#[derive(Debug, Clone)]
pub struct Friendship {
    pub id: i64,
    pub user1_id: UserId,
    pub user2_id: UserId,
    pub created_at: i64,
}

/// Repository for friendship edges.
pub struct FriendshipRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> FriendshipRepository<'a> {
    /// Create a new friendship repository.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a friendship edge for the unordered pair.
    ///
    /// Canonicalizes ordering before insertion; a UNIQUE violation on the
    /// pair maps to [`DbError::FriendshipExists`] so callers can treat the
    /// duplicate as an idempotent no-op.
    pub async fn create(&self, user_a: UserId, user_b: UserId) -> Result<Friendship, DbError> {
        let (user1, user2) = canonical_pair(user_a, user_b);
        let now = chrono::Utc::now().timestamp();

        let result = sqlx::query(
            r#"
            INSERT INTO friendships (user1_id, user2_id, created_at)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(user1)
        .bind(user2)
        .bind(now)
        .execute(self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return DbError::FriendshipExists(user1, user2);
            }
            DbError::from(e)
        })?;

        Ok(Friendship {
            id: result.last_insert_rowid(),
            user1_id: user1,
            user2_id: user2,
            created_at: now,
        })
    }

    /// Check whether a friendship row exists for the unordered pair.
    pub async fn are_friends(&self, a: UserId, b: UserId) -> Result<bool, DbError> {
        let (user1, user2) = canonical_pair(a, b);
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM friendships
            WHERE user1_id = ? AND user2_id = ?
            "#,
        )
        .bind(user1)
        .bind(user2)
        .fetch_one(self.pool)
        .await?;

        Ok(count > 0)
    }

    /// Find the friendship row for the unordered pair.
    pub async fn find_between(&self, a: UserId, b: UserId) -> Result<Option<Friendship>, DbError> {
        let (user1, user2) = canonical_pair(a, b);
        let row = sqlx::query_as::<_, (i64, i64, i64, i64)>(
            r#"
            SELECT id, user1_id, user2_id, created_at
            FROM friendships
            WHERE user1_id = ? AND user2_id = ?
            "#,
        )
        .bind(user1)
        .bind(user2)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(|(id, user1_id, user2_id, created_at)| Friendship {
            id,
            user1_id,
            user2_id,
            created_at,
        }))
    }

    /// Delete the friendship for the unordered pair.
    ///
    /// Returns whether a row was removed; silently a no-op when absent.
    /// Callers that need to distinguish must pre-check existence.
    pub async fn delete(&self, a: UserId, b: UserId) -> Result<bool, DbError> {
        let result = sqlx::query(
            r#"
            DELETE FROM friendships
            WHERE (user1_id = ? AND user2_id = ?)
               OR (user1_id = ? AND user2_id = ?)
            "#,
        )
        .bind(a)
        .bind(b)
        .bind(b)
        .bind(a)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Get the ids of all friends of a user.
    pub async fn friend_ids(&self, user_id: UserId) -> Result<Vec<UserId>, DbError> {
        let ids = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT CASE WHEN user1_id = ? THEN user2_id ELSE user1_id END
            FROM friendships
            WHERE user1_id = ? OR user2_id = ?
            "#,
        )
        .bind(user_id)
        .bind(user_id)
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(ids)
    }

    /// Get all friends of a user as user rows.
    pub async fn friends(&self, user_id: UserId) -> Result<Vec<User>, DbError> {
        let rows = sqlx::query_as::<_, (i64, String, i64)>(
            r#"
            SELECT u.id, u.username, u.created_at
            FROM users u
            JOIN friendships f
              ON (f.user1_id = ? AND f.user2_id = u.id)
              OR (f.user2_id = ? AND f.user1_id = u.id)
            ORDER BY u.username
            "#,
        )
        .bind(user_id)
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(id, username, created_at)| User {
                id,
                username,
                created_at,
            })
            .collect())
    }

    /// Count a user's friends.
    pub async fn count(&self, user_id: UserId) -> Result<i64, DbError> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM friendships
            WHERE user1_id = ? OR user2_id = ?
            "#,
        )
        .bind(user_id)
        .bind(user_id)
        .fetch_one(self.pool)
        .await?;

        Ok(count)
    }

    /// Get users who are friends with both `a` and `b`, excluding the pair
    /// themselves.
    pub async fn mutual_friends(&self, a: UserId, b: UserId) -> Result<Vec<User>, DbError> {
        let rows = sqlx::query_as::<_, (i64, String, i64)>(
            r#"
            SELECT u.id, u.username, u.created_at
            FROM users u
            WHERE u.id != ? AND u.id != ?
              AND u.id IN (
                SELECT CASE WHEN user1_id = ? THEN user2_id ELSE user1_id END
                FROM friendships WHERE user1_id = ? OR user2_id = ?
              )
              AND u.id IN (
                SELECT CASE WHEN user1_id = ? THEN user2_id ELSE user1_id END
                FROM friendships WHERE user1_id = ? OR user2_id = ?
              )
            ORDER BY u.username
            "#,
        )
        .bind(a)
        .bind(b)
        .bind(a)
        .bind(a)
        .bind(a)
        .bind(b)
        .bind(b)
        .bind(b)
        .fetch_all(self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(id, username, created_at)| User {
                id,
                username,
                created_at,
            })
            .collect())
    }

    /// Search a user's friends by username substring (case-insensitive).
    pub async fn search_friends(&self, user_id: UserId, term: &str) -> Result<Vec<User>, DbError> {
        // Escape LIKE wildcards in the caller's term so it stays a literal
        // substring match.
        let escaped = term.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_");
        let pattern = format!("%{escaped}%");

        let rows = sqlx::query_as::<_, (i64, String, i64)>(
            r#"
            SELECT u.id, u.username, u.created_at
            FROM users u
            WHERE u.id IN (
                SELECT CASE WHEN user1_id = ? THEN user2_id ELSE user1_id END
                FROM friendships WHERE user1_id = ? OR user2_id = ?
              )
              AND u.username LIKE ? ESCAPE '\'
            ORDER BY u.username
            "#,
        )
        .bind(user_id)
        .bind(user_id)
        .bind(user_id)
        .bind(pattern)
        .fetch_all(self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(id, username, created_at)| User {
                id,
                username,
                created_at,
            })
            .collect())
    }
}

/// Order a pair so the smaller id comes first.
pub(crate) fn canonical_pair(a: UserId, b: UserId) -> (UserId, UserId) {
    if a < b { (a, b) } else { (b, a) }
}
