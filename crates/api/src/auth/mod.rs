//! Authentication primitives.
//!
//! - [`password`] -- Argon2id password hashing and verification.
//! - [`jwt`] -- signed token issuance and validation (the credential codec).

pub mod jwt;
pub mod password;
