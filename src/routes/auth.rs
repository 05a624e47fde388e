//! Account routes

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::auth::accounts::{self, LoginRequest, SignupRequest};
use crate::auth::Principal;
use crate::db::{User, UserRepository};
use crate::error::{AppError, Result};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup))
        .route("/login", post(login))
        .route("/token/refresh", post(refresh))
        .route("/logout", post(logout))
        .route("/profile", get(profile))
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
    pub user: User,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub access_token: String,
    pub expires_in: i64,
}

#[derive(Debug, Default, Deserialize)]
pub struct LogoutRequest {
    #[serde(default)]
    pub refresh_token: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub user: User,
}

async fn signup(
    State(state): State<AppState>,
    body: std::result::Result<Json<SignupRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<SessionResponse>)> {
    let Json(body) = body?;
    let (user, tokens) = accounts::signup(state.db(), &state.config().auth, body).await?;
    Ok((
        StatusCode::CREATED,
        Json(SessionResponse {
            message: Some("User created successfully"),
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            expires_in: tokens.expires_in,
            user,
        }),
    ))
}

async fn login(
    State(state): State<AppState>,
    body: std::result::Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<SessionResponse>> {
    let Json(body) = body?;
    let (user, tokens) = accounts::login(state.db(), &state.config().auth, body).await?;
    Ok(Json(SessionResponse {
        message: None,
        access_token: tokens.access_token,
        refresh_token: tokens.refresh_token,
        expires_in: tokens.expires_in,
        user,
    }))
}

async fn refresh(
    State(state): State<AppState>,
    body: std::result::Result<Json<RefreshRequest>, JsonRejection>,
) -> Result<Json<RefreshResponse>> {
    let Json(body) = body?;
    let refresh_token = body
        .refresh_token
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::Validation("refresh_token is required".to_string()))?;

    let config = &state.config().auth;
    let access_token = accounts::refresh(state.db(), config, &refresh_token).await?;
    Ok(Json(RefreshResponse {
        access_token,
        expires_in: config.access_token_ttl_minutes * 60,
    }))
}

async fn logout(
    State(state): State<AppState>,
    principal: Principal,
    body: Option<Json<LogoutRequest>>,
) -> Result<Json<MessageResponse>> {
    let body = body.map(|Json(b)| b).unwrap_or_default();
    accounts::logout(state.db(), &principal, body.refresh_token.as_deref()).await?;
    Ok(Json(MessageResponse {
        message: "Successfully logged out",
    }))
}

async fn profile(State(state): State<AppState>, principal: Principal) -> Result<Json<ProfileResponse>> {
    let user = UserRepository::new(state.db())
        .get(&principal.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
    Ok(Json(ProfileResponse { user }))
}
