//! Account and token database operations

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::error::{AppError, Result};

/// User record
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    #[serde(skip)]
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub date_joined: String,
}

/// Create user request
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

/// User repository
pub struct UserRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> UserRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, id: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password_hash, first_name, last_name, date_joined
            FROM users
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(user)
    }

    pub async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password_hash, first_name, last_name, date_joined
            FROM users
            WHERE username = ?
            "#,
        )
        .bind(username)
        .fetch_optional(self.pool)
        .await?;

        Ok(user)
    }

    pub async fn username_exists(&self, username: &str) -> Result<bool> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users WHERE username = ?")
            .bind(username)
            .fetch_one(self.pool)
            .await?;
        Ok(count > 0)
    }

    pub async fn email_exists(&self, email: &str) -> Result<bool> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users WHERE email = ?")
            .bind(email)
            .fetch_one(self.pool)
            .await?;
        Ok(count > 0)
    }

    pub async fn create(&self, data: &NewUser) -> Result<User> {
        let id = Uuid::new_v4().to_string();

        sqlx::query(
            r#"
            INSERT INTO users (id, username, email, password_hash, date_joined)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&data.username)
        .bind(&data.email)
        .bind(&data.password_hash)
        .bind(super::now())
        .execute(self.pool)
        .await?;

        self.get(&id)
            .await?
            .ok_or_else(|| AppError::Internal("Failed to fetch created user".to_string()))
    }
}

/// Kind of issued bearer token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Access,
    Refresh,
}

impl TokenKind {
    fn as_str(&self) -> &'static str {
        match self {
            TokenKind::Access => "access",
            TokenKind::Refresh => "refresh",
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct TokenRow {
    user_id: String,
    expires_at: String,
    revoked: bool,
}

/// Token repository; only digests of tokens are stored
pub struct TokenRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> TokenRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn insert(
        &self,
        token_hash: &str,
        user_id: &str,
        kind: TokenKind,
        expires_at: DateTime<Utc>,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO auth_tokens (token_hash, user_id, kind, expires_at, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(token_hash)
        .bind(user_id)
        .bind(kind.as_str())
        .bind(super::timestamp(expires_at))
        .bind(super::now())
        .execute(self.pool)
        .await?;

        Ok(())
    }

    /// Owner of a live (unrevoked, unexpired) token of the given kind
    pub async fn find_active(&self, token_hash: &str, kind: TokenKind) -> Result<Option<String>> {
        let row = sqlx::query_as::<_, TokenRow>(
            r#"
            SELECT user_id, expires_at, revoked
            FROM auth_tokens
            WHERE token_hash = ? AND kind = ?
            "#,
        )
        .bind(token_hash)
        .bind(kind.as_str())
        .fetch_optional(self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        if row.revoked {
            return Ok(None);
        }

        let expires_at = DateTime::parse_from_rfc3339(&row.expires_at)
            .map_err(|e| super::corrupt("expires_at", e.to_string()))?;
        if expires_at <= Utc::now() {
            return Ok(None);
        }

        Ok(Some(row.user_id))
    }

    /// Revoke a token; returns false if it was unknown
    pub async fn revoke(&self, token_hash: &str) -> Result<bool> {
        let result = sqlx::query("UPDATE auth_tokens SET revoked = 1 WHERE token_hash = ?")
            .bind(token_hash)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support;
    use chrono::Duration;

    #[tokio::test]
    async fn test_create_and_lookup_user() {
        let (pool, _dir) = test_support::pool().await;
        let repo = UserRepository::new(&pool);

        let user = test_support::user(&pool, "alice").await;
        assert_eq!(user.username, "alice");
        assert!(repo.username_exists("alice").await.unwrap());
        assert!(repo.email_exists("alice@example.com").await.unwrap());
        assert!(!repo.username_exists("bob").await.unwrap());

        let found = repo.find_by_username("alice").await.unwrap().unwrap();
        assert_eq!(found.id, user.id);
    }

    #[tokio::test]
    async fn test_duplicate_username_is_rejected_by_schema() {
        let (pool, _dir) = test_support::pool().await;
        test_support::user(&pool, "alice").await;

        let result = UserRepository::new(&pool)
            .create(&NewUser {
                username: "alice".into(),
                email: String::new(),
                password_hash: "x".into(),
            })
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_token_lifecycle() {
        let (pool, _dir) = test_support::pool().await;
        let user = test_support::user(&pool, "alice").await;
        let repo = TokenRepository::new(&pool);

        let expires = Utc::now() + Duration::minutes(5);
        repo.insert("live", &user.id, TokenKind::Access, expires).await.unwrap();
        repo.insert("old", &user.id, TokenKind::Access, Utc::now() - Duration::minutes(1))
            .await
            .unwrap();

        assert_eq!(
            repo.find_active("live", TokenKind::Access).await.unwrap(),
            Some(user.id.clone())
        );
        // Wrong kind or expired tokens are not accepted
        assert_eq!(repo.find_active("live", TokenKind::Refresh).await.unwrap(), None);
        assert_eq!(repo.find_active("old", TokenKind::Access).await.unwrap(), None);

        assert!(repo.revoke("live").await.unwrap());
        assert_eq!(repo.find_active("live", TokenKind::Access).await.unwrap(), None);
        assert!(!repo.revoke("missing").await.unwrap());
    }
}
