//! User directory repository.
//!
//! The identity system that registers users and issues credentials is an
//! external collaborator; the core only reads this table to resolve ids and
//! usernames. `create` exists for seeding and administrative tooling.

use super::DbError;
use crate::UserId;
use sqlx::SqlitePool;

/// A user known to the directory.
#[derive(Debug, Clone)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub created_at: i64,
}

/// Repository for user directory lookups.
pub struct UserRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a user record.
    pub async fn create(&self, username: &str) -> Result<User, DbError> {
        let now = chrono::Utc::now().timestamp();

        let result = sqlx::query(
            r#"
            INSERT INTO users (username, created_at)
            VALUES (?, ?)
            "#,
        )
        .bind(username)
        .bind(now)
        .execute(self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return DbError::UsernameTaken(username.to_string());
            }
            DbError::from(e)
        })?;

        Ok(User {
            id: result.last_insert_rowid(),
            username: username.to_string(),
            created_at: now,
        })
    }

    /// Find user by id.
    pub async fn find_by_id(&self, id: UserId) -> Result<Option<User>, DbError> {
        let row = sqlx::query_as::<_, (i64, String, i64)>(
            r#"
            SELECT id, username, created_at
            FROM users
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(|(id, username, created_at)| User {
            id,
            username,
            created_at,
        }))
    }

    /// Find user by username (case-insensitive).
    pub async fn find_by_username(&self, username: &str) -> Result<Option<User>, DbError> {
        let row = sqlx::query_as::<_, (i64, String, i64)>(
            r#"
            SELECT id, username, created_at
            FROM users
            WHERE username = ? COLLATE NOCASE
            "#,
        )
        .bind(username)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(|(id, username, created_at)| User {
            id,
            username,
            created_at,
        }))
    }

    /// Check whether a user id exists.
    pub async fn exists(&self, id: UserId) -> Result<bool, DbError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE id = ?")
            .bind(id)
            .fetch_one(self.pool)
            .await?;
        Ok(count > 0)
    }
}
