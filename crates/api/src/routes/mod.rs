pub mod auth;
pub mod health;
pub mod users;

use axum::Router;

use crate::state::AppState;

/// Build the application route tree (health is mounted separately).
///
/// ```text
/// POST   /auth/login           login (public)
/// POST   /auth/register        register (public)
/// POST   /auth/refresh         refresh (public)
/// POST   /auth/logout          logout (requires auth)
/// GET    /auth/devices         list sessions (requires auth)
/// DELETE /auth/devices         logout everywhere (requires auth)
/// DELETE /auth/devices/{id}    logout one device (requires auth)
/// GET    /users/me             account summary (requires auth)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(auth::router())
        .merge(users::router())
}
