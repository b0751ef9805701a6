//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` entity struct matching the database row
//! - A create DTO for inserts
//! - Safe response shapes for API output where the row carries secrets

pub mod device;
pub mod user;
