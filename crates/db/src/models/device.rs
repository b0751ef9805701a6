//! Device (session) model and DTOs.

use keygate_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// A device row from the `devices` table.
///
/// One row exists per currently-valid refresh-token lineage. The `jti`
/// column holds the session id of the lineage's live refresh token and is
/// rotated in place on every successful refresh.
#[derive(Debug, Clone, FromRow)]
pub struct Device {
    pub id: DbId,
    pub user_id: DbId,
    pub user_agent: String,
    pub ip: String,
    pub location: String,
    pub jti: Uuid,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Display shape for device listings. Deliberately omits the raw jti.
#[derive(Debug, Clone, Serialize)]
pub struct DeviceSummary {
    pub id: DbId,
    pub user_agent: String,
    pub ip: String,
    pub location: String,
}

impl From<&Device> for DeviceSummary {
    fn from(device: &Device) -> Self {
        Self {
            id: device.id,
            user_agent: device.user_agent.clone(),
            ip: device.ip.clone(),
            location: device.location.clone(),
        }
    }
}

/// DTO for creating a new device row.
pub struct CreateDevice {
    pub user_id: DbId,
    pub user_agent: String,
    pub ip: String,
    pub location: String,
    pub jti: Uuid,
}
