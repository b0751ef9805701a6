//! Handlers for the `/auth/devices` resource.

use axum::extract::{Path, State};
use axum::Json;
use keygate_core::types::DbId;
use keygate_db::models::device::DeviceSummary;

use crate::error::AppResult;
use crate::middleware::auth::CurrentUser;
use crate::response::MessageResponse;
use crate::state::AppState;

/// GET /auth/devices
///
/// List the caller's active sessions. An account with no sessions gets
/// an empty list, not an error.
pub async fn list_devices(
    State(state): State<AppState>,
    current: CurrentUser,
) -> AppResult<Json<Vec<DeviceSummary>>> {
    let devices = state.engine.list_devices(&current.user).await?;
    Ok(Json(devices))
}

/// DELETE /auth/devices/{device_id}
///
/// Close one of the caller's sessions by device id. 404 if the device
/// does not exist or belongs to someone else.
pub async fn logout_device(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(device_id): Path<DbId>,
) -> AppResult<Json<MessageResponse>> {
    state.engine.logout_device(&current.user, device_id).await?;
    Ok(Json(MessageResponse::new("Device logged out")))
}

/// DELETE /auth/devices
///
/// Close every session the caller has. 404 if there was nothing to
/// delete (deliberate asymmetry with the tolerant read above).
pub async fn logout_all_devices(
    State(state): State<AppState>,
    current: CurrentUser,
) -> AppResult<Json<MessageResponse>> {
    state.engine.logout_all_devices(&current.user).await?;
    Ok(Json(MessageResponse::new("All devices logged out")))
}
