//! Periodic cleanup of expired session state.
//!
//! Two things accumulate as sessions age out: revocation-ledger entries
//! whose deadline passed, and device rows whose refresh token expired
//! without a logout. Neither is reachable by any valid token anymore;
//! this task reclaims both on a fixed interval using
//! `tokio::time::interval`.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use keygate_core::revocation::RevocationLedger;
use keygate_db::repositories::DeviceRepo;
use sqlx::PgPool;
use tokio_util::sync::CancellationToken;

/// How often the sweep runs.
const SWEEP_INTERVAL: Duration = Duration::from_secs(3600); // 1 hour

/// Run the session sweep loop until `cancel` is triggered.
///
/// `refresh_expiry_mins` is the configured refresh-token lifetime; device
/// rows not refreshed within it are dead lineages.
pub async fn run(
    pool: PgPool,
    ledger: Arc<RevocationLedger>,
    refresh_expiry_mins: i64,
    cancel: CancellationToken,
) {
    tracing::info!(
        interval_secs = SWEEP_INTERVAL.as_secs(),
        refresh_expiry_mins,
        "Session sweep job started"
    );

    let mut interval = tokio::time::interval(SWEEP_INTERVAL);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Session sweep job stopping");
                break;
            }
            _ = interval.tick() => {
                let swept = ledger.sweep();
                if swept > 0 {
                    tracing::debug!(swept, "Session sweep: dropped expired ledger entries");
                }

                let cutoff = Utc::now() - chrono::Duration::minutes(refresh_expiry_mins);
                match DeviceRepo::delete_stale(&pool, cutoff).await {
                    Ok(deleted) if deleted > 0 => {
                        tracing::info!(deleted, "Session sweep: purged stale device rows");
                    }
                    Ok(_) => {
                        tracing::debug!("Session sweep: no stale device rows");
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Session sweep: device cleanup failed");
                    }
                }
            }
        }
    }
}
