//! Handlers for the `/auth` resource (login, register, refresh, logout).
//!
//! Handlers stay thin: payload extraction and validation here, lifecycle
//! semantics in the [`SessionEngine`].
//!
//! [`SessionEngine`]: crate::engine::SessionEngine

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::CurrentUser;
use crate::middleware::client::ClientMeta;
use crate::response::{MessageResponse, TokenPair};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// Request body for `POST /auth/login`.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Request body for `POST /auth/register`.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    pub password: String,
    pub re_password: String,
}

/// Request body for `POST /auth/refresh`.
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Request body for `POST /auth/logout`.
#[derive(Debug, Deserialize)]
pub struct LogoutRequest {
    pub refresh_token: String,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /auth/login
///
/// Authenticate with email + password. Returns a token pair and records
/// a new device session.
pub async fn login(
    State(state): State<AppState>,
    client: ClientMeta,
    Json(input): Json<LoginRequest>,
) -> AppResult<Json<TokenPair>> {
    let pair = state
        .engine
        .login(&input.email, &input.password, &client.user_agent, &client.ip)
        .await?;
    Ok(Json(pair))
}

/// POST /auth/register
///
/// Create an account and its first device session. Returns 201 with a
/// token pair.
pub async fn register(
    State(state): State<AppState>,
    client: ClientMeta,
    Json(input): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<TokenPair>)> {
    input
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let pair = state
        .engine
        .register(
            &input.email,
            &input.password,
            &input.re_password,
            &client.ip,
            &client.user_agent,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(pair)))
}

/// POST /auth/refresh
///
/// Exchange a valid refresh token for a new pair. Single-use: the
/// presented token's session id is rotated away.
pub async fn refresh(
    State(state): State<AppState>,
    client: ClientMeta,
    Json(input): Json<RefreshRequest>,
) -> AppResult<Json<TokenPair>> {
    let pair = state
        .engine
        .refresh(&input.refresh_token, &client.user_agent)
        .await?;
    Ok(Json(pair))
}

/// POST /auth/logout
///
/// Close the session named by the refresh token. Requires a valid access
/// token as well.
pub async fn logout(
    State(state): State<AppState>,
    _current: CurrentUser,
    Json(input): Json<LogoutRequest>,
) -> AppResult<Json<MessageResponse>> {
    state.engine.logout(&input.refresh_token).await?;
    Ok(Json(MessageResponse::new("Successfully logged out")))
}
