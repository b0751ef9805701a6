//! In-process revocation ledger for spent refresh-token session ids.
//!
//! Row rotation in the device store is the primary single-use guarantee;
//! this ledger is the second line of defense. Every consumed or logged-out
//! `jti` is recorded here with a deadline no later than the refresh token's
//! own expiry, so a replayed token is rejected even before the store is
//! consulted. Absence of an entry means "not revoked".

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use uuid::Uuid;

/// TTL set of revoked session ids. Cheap to share via `Arc`; the lock is
/// held only for map access, never across I/O.
#[derive(Debug, Default)]
pub struct RevocationLedger {
    entries: Mutex<HashMap<Uuid, Instant>>,
}

impl RevocationLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a session id as revoked for `ttl`.
    ///
    /// Re-revoking an id keeps the later deadline, so a logout after a
    /// rotation cannot shorten the entry's lifetime.
    pub fn revoke(&self, jti: Uuid, ttl: Duration) {
        let deadline = Instant::now() + ttl;
        let mut entries = self.entries.lock().expect("revocation ledger poisoned");
        let entry = entries.entry(jti).or_insert(deadline);
        if *entry < deadline {
            *entry = deadline;
        }
    }

    /// Whether the session id is currently revoked. Expired entries read
    /// as not revoked; they are physically removed by [`sweep`].
    ///
    /// [`sweep`]: RevocationLedger::sweep
    pub fn is_revoked(&self, jti: &Uuid) -> bool {
        let entries = self.entries.lock().expect("revocation ledger poisoned");
        entries
            .get(jti)
            .is_some_and(|deadline| *deadline > Instant::now())
    }

    /// Drop expired entries, returning how many were removed. Called
    /// periodically by the background sweeper so the ledger never grows
    /// past the set of refresh tokens that are still unexpired.
    pub fn sweep(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.lock().expect("revocation ledger poisoned");
        let before = entries.len();
        entries.retain(|_, deadline| *deadline > now);
        before - entries.len()
    }

    /// Number of live entries (expired-but-unswept included).
    pub fn len(&self) -> usize {
        self.entries.lock().expect("revocation ledger poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
