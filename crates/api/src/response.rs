//! Shared response types for API handlers.

use serde::Serialize;

/// Simple `{ "message": ... }` acknowledgement body used by logout-style
/// endpoints that have nothing else to return.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

impl MessageResponse {
    pub fn new(message: &'static str) -> Self {
        Self { message }
    }
}

/// The issued credential pair. Not persisted anywhere -- derived on
/// demand from the account and a freshly generated session id.
#[derive(Debug, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    /// Always `"Bearer"`.
    pub token_type: &'static str,
}

impl TokenPair {
    pub fn new(access_token: String, refresh_token: String) -> Self {
        Self {
            access_token,
            refresh_token,
            token_type: "Bearer",
        }
    }
}
