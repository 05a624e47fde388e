//! Account operations: signup, login, refresh, logout

use serde::Deserialize;
use sqlx::SqlitePool;

use super::password::{hash_password, verify_password};
use super::token::{hash_token, issue_access_token, issue_pair, TokenPair};
use super::Principal;
use crate::config::AuthConfig;
use crate::db::{NewUser, TokenKind, TokenRepository, User, UserRepository};
use crate::error::{AppError, Result};

/// Signup request body
#[derive(Debug, Default, Deserialize)]
pub struct SignupRequest {
    pub username: Option<String>,
    pub password: Option<String>,
    pub password_confirm: Option<String>,
    #[serde(default)]
    pub email: String,
}

/// Login request body
#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

fn required(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Create an account and sign it in
pub async fn signup(pool: &SqlitePool, config: &AuthConfig, req: SignupRequest) -> Result<(User, TokenPair)> {
    let (Some(username), Some(password)) = (required(req.username), req.password.filter(|p| !p.is_empty())) else {
        return Err(AppError::Validation("Username and password are required".to_string()));
    };
    if req.password_confirm.as_deref() != Some(password.as_str()) {
        return Err(AppError::Validation("Passwords do not match".to_string()));
    }

    let users = UserRepository::new(pool);
    if users.username_exists(&username).await? {
        return Err(AppError::Validation("Username already exists".to_string()));
    }
    let email = req.email.trim().to_string();
    if !email.is_empty() && users.email_exists(&email).await? {
        return Err(AppError::Validation("Email already exists".to_string()));
    }

    let user = users
        .create(&NewUser {
            username,
            email,
            password_hash: hash_password(&password),
        })
        .await?;
    let tokens = issue_pair(pool, &user.id, config).await?;

    tracing::info!(user_id = %user.id, username = %user.username, "Account created");
    Ok((user, tokens))
}

pub async fn login(pool: &SqlitePool, config: &AuthConfig, req: LoginRequest) -> Result<(User, TokenPair)> {
    let (Some(username), Some(password)) = (required(req.username), req.password.filter(|p| !p.is_empty())) else {
        return Err(AppError::Validation("Username and password are required".to_string()));
    };

    let user = UserRepository::new(pool).find_by_username(&username).await?;
    let Some(user) = user.filter(|u| verify_password(&password, &u.password_hash)) else {
        tracing::debug!(username = %username, "Rejected login");
        return Err(AppError::Unauthorized("Invalid username or password".to_string()));
    };

    let tokens = issue_pair(pool, &user.id, config).await?;
    Ok((user, tokens))
}

/// Exchange a live refresh token for a new access token
pub async fn refresh(pool: &SqlitePool, config: &AuthConfig, refresh_token: &str) -> Result<String> {
    let user_id = TokenRepository::new(pool)
        .find_active(&hash_token(refresh_token), TokenKind::Refresh)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Invalid or expired refresh token".to_string()))?;

    issue_access_token(pool, &user_id, config).await
}

/// Revoke the presented access token and, when given, the refresh token
pub async fn logout(pool: &SqlitePool, principal: &Principal, refresh_token: Option<&str>) -> Result<()> {
    let tokens = TokenRepository::new(pool);
    tokens.revoke(&principal.token_hash).await?;
    if let Some(refresh_token) = refresh_token {
        tokens.revoke(&hash_token(refresh_token)).await?;
    }

    tracing::info!(user_id = %principal.user_id, "Logged out");
    Ok(())
}
