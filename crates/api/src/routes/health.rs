//! Liveness/readiness probe, mounted at the root (outside `/auth`).

use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

/// Probe payload. `status` degrades when a dependency is down; the
/// per-dependency detail sits alongside it.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    /// `"up"` or `"down"`. Postgres is the only hard dependency.
    pub database: &'static str,
}

/// GET /health
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let database = match keygate_db::health_check(&state.pool).await {
        Ok(()) => "up",
        Err(e) => {
            tracing::warn!(error = %e, "Health probe: database unreachable");
            "down"
        }
    };

    Json(HealthResponse {
        status: if database == "up" { "ok" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        database,
    })
}

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
