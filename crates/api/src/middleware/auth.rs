//! Bearer-token access guard for Axum handlers.
//!
//! Access tokens are deliberately stateless: the guard validates the
//! signature and kind tag and resolves the subject to a live account, but
//! performs no device-row lookup. Only refresh tokens are revocable
//! before natural expiry.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use keygate_core::error::AuthError;
use keygate_db::models::user::User;
use keygate_db::repositories::UserRepo;

use crate::auth::jwt::{decode_token, TokenKind};
use crate::error::AppError;
use crate::state::AppState;

/// Authenticated account extracted from a JWT Bearer token in the
/// `Authorization` header.
///
/// Use this as an extractor parameter in any handler that requires
/// authentication:
///
/// ```ignore
/// async fn my_handler(current: CurrentUser) -> AppResult<Json<()>> {
///     tracing::info!(user_id = %current.user.id, "handling request");
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct CurrentUser {
    /// The resolved account row. Guaranteed active.
    pub user: User,
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or(AuthError::InvalidToken)?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(AuthError::InvalidToken)?;

        let claims = decode_token(token, &state.config.jwt)?;
        claims.require_kind(TokenKind::Access)?;

        // The account may have been deleted or suspended after issuance.
        let user = UserRepo::find_by_id(&state.pool, claims.sub)
            .await?
            .ok_or(AuthError::AccountNotFound)?;

        if !user.is_active {
            return Err(AuthError::AccountNotActive.into());
        }

        Ok(CurrentUser { user })
    }
}
