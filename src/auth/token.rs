//! Opaque bearer tokens

use base64::Engine;
use chrono::{Duration, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};
use sqlx::SqlitePool;

use crate::config::AuthConfig;
use crate::db::{TokenKind, TokenRepository};
use crate::error::Result;

/// Random bearer token, URL-safe base64 over 32 bytes
pub fn generate_token() -> String {
    let bytes: [u8; 32] = rand::random();
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

/// Hex SHA-256 digest; the only form a token is stored in
pub fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

/// Freshly issued access/refresh pair
#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    /// Access token lifetime in seconds
    pub expires_in: i64,
}

pub async fn issue_access_token(pool: &SqlitePool, user_id: &str, config: &AuthConfig) -> Result<String> {
    let token = generate_token();
    let expires_at = Utc::now() + Duration::minutes(config.access_token_ttl_minutes);
    TokenRepository::new(pool)
        .insert(&hash_token(&token), user_id, TokenKind::Access, expires_at)
        .await?;
    Ok(token)
}

pub async fn issue_pair(pool: &SqlitePool, user_id: &str, config: &AuthConfig) -> Result<TokenPair> {
    let access_token = issue_access_token(pool, user_id, config).await?;

    let refresh_token = generate_token();
    let expires_at = Utc::now() + Duration::hours(config.refresh_token_ttl_hours);
    TokenRepository::new(pool)
        .insert(&hash_token(&refresh_token), user_id, TokenKind::Refresh, expires_at)
        .await?;

    Ok(TokenPair {
        access_token,
        refresh_token,
        expires_in: config.access_token_ttl_minutes * 60,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_token_is_unique() {
        let a = generate_token();
        let b = generate_token();
        assert_ne!(a, b);
        assert_eq!(a.len(), 43);
    }

    #[test]
    fn test_hash_token_is_deterministic_hex() {
        let digest = hash_token("abc");
        assert_eq!(digest, hash_token("abc"));
        assert_ne!(digest, hash_token("abd"));
        assert_eq!(digest.len(), 64);
    }
}
