//! Shared domain types for the keygate auth service.
//!
//! - [`error`] -- the domain error taxonomy surfaced by every layer.
//! - [`types`] -- id and timestamp aliases used across crates.
//! - [`revocation`] -- in-process TTL set of spent refresh-token ids.

pub mod error;
pub mod revocation;
pub mod types;

pub use error::AuthError;
pub use revocation::RevocationLedger;
