//! Repository for the `devices` table.

use chrono::{DateTime, Utc};
use keygate_core::types::DbId;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::device::{CreateDevice, Device};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, user_id, user_agent, ip, location, jti, created_at, updated_at";

/// Provides CRUD operations for devices (login sessions).
pub struct DeviceRepo;

impl DeviceRepo {
    /// Insert a new device row, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateDevice) -> Result<Device, sqlx::Error> {
        let query = format!(
            "INSERT INTO devices (user_id, user_agent, ip, location, jti)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Device>(&query)
            .bind(input.user_id)
            .bind(&input.user_agent)
            .bind(&input.ip)
            .bind(&input.location)
            .bind(input.jti)
            .fetch_one(pool)
            .await
    }

    /// Find the device bound to a refresh-token session id.
    pub async fn find_by_user_and_jti(
        pool: &PgPool,
        user_id: DbId,
        jti: Uuid,
    ) -> Result<Option<Device>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM devices WHERE user_id = $1 AND jti = $2");
        sqlx::query_as::<_, Device>(&query)
            .bind(user_id)
            .bind(jti)
            .fetch_optional(pool)
            .await
    }

    /// Rotate a device's session id from `current_jti` to `new_jti`.
    ///
    /// Single conditional UPDATE keyed on the old jti, so two concurrent
    /// refreshes of the same token serialize at the row: exactly one
    /// caller sees `true`, the loser sees `false` and must treat the
    /// token as already spent.
    pub async fn rotate_jti(
        pool: &PgPool,
        user_id: DbId,
        current_jti: Uuid,
        new_jti: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE devices SET jti = $3, updated_at = NOW()
             WHERE user_id = $1 AND jti = $2",
        )
        .bind(user_id)
        .bind(current_jti)
        .bind(new_jti)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete the device bound to a session id. Returns `true` if a row
    /// was deleted.
    pub async fn delete_by_user_and_jti(
        pool: &PgPool,
        user_id: DbId,
        jti: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM devices WHERE user_id = $1 AND jti = $2")
            .bind(user_id)
            .bind(jti)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete a device by its own row id, scoped to the owning user.
    /// Returns `true` if a row was deleted.
    pub async fn delete_by_user_and_id(
        pool: &PgPool,
        user_id: DbId,
        device_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM devices WHERE user_id = $1 AND id = $2")
            .bind(user_id)
            .bind(device_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete all devices for a user. Returns the count of deleted rows.
    pub async fn delete_all_for_user(pool: &PgPool, user_id: DbId) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM devices WHERE user_id = $1")
            .bind(user_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// List a user's devices, most recently active first.
    pub async fn list_for_user(pool: &PgPool, user_id: DbId) -> Result<Vec<Device>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM devices WHERE user_id = $1 ORDER BY updated_at DESC");
        sqlx::query_as::<_, Device>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    /// Delete rows not refreshed since `cutoff`. Their refresh tokens
    /// have expired, so the rows can never be presented again. Returns
    /// the count of deleted rows.
    pub async fn delete_stale(
        pool: &PgPool,
        cutoff: DateTime<Utc>,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM devices WHERE updated_at < $1")
            .bind(cutoff)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}
