//! The session lifecycle engine.

pub mod session;

pub use session::SessionEngine;
