//! Handlers for the `/users` resource.

use axum::Json;
use keygate_db::models::user::UserResponse;

use crate::error::AppResult;
use crate::middleware::auth::CurrentUser;

/// GET /users/me
///
/// Return the authenticated account's public summary.
pub async fn me(current: CurrentUser) -> AppResult<Json<UserResponse>> {
    Ok(Json(UserResponse::from(&current.user)))
}
