//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - `Deserialize` DTOs for the operations that write to it

pub mod access_grant;
pub mod collaborator;
pub mod event;
pub mod module_lock;
pub mod module_version;
pub mod notification;
pub mod order;
pub mod otp;
pub mod transfer;
pub mod user;
