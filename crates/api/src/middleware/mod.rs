//! Request extractors shared across handlers.
//!
//! - [`auth`] -- bearer-token access guard resolving the current user.
//! - [`client`] -- user-agent / client-ip metadata extraction.

pub mod auth;
pub mod client;
