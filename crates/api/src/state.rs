use std::sync::Arc;

use keygate_core::revocation::RevocationLedger;

use crate::config::ServerConfig;
use crate::engine::SessionEngine;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: keygate_db::DbPool,
    /// Server configuration (read-only after boot).
    pub config: Arc<ServerConfig>,
    /// Ledger of spent refresh-token session ids.
    pub ledger: Arc<RevocationLedger>,
    /// The session lifecycle engine.
    pub engine: SessionEngine,
}

impl AppState {
    /// Wire up state from its roots; the engine shares the same pool,
    /// config, and ledger handles.
    pub fn new(
        pool: keygate_db::DbPool,
        config: Arc<ServerConfig>,
        ledger: Arc<RevocationLedger>,
    ) -> Self {
        let engine = SessionEngine::new(pool.clone(), Arc::clone(&config), Arc::clone(&ledger));
        Self {
            pool,
            config,
            ledger,
            engine,
        }
    }
}
