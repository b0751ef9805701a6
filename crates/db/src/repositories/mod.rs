//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument. Queries are typed per
//! call shape -- no dynamic filter building.

pub mod device_repo;
pub mod user_repo;

pub use device_repo::DeviceRepo;
pub use user_repo::UserRepo;
