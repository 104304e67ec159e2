//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument. Every status transition
//! is a conditional update guarded on the expected prior status; zero
//! rows affected surfaces as `None`/`false` so callers can map it to a
//! Conflict instead of silently losing a race.

pub mod access_grant_repo;
pub mod collaborator_repo;
pub mod event_repo;
pub mod module_draft_repo;
pub mod module_lock_repo;
pub mod module_version_repo;
pub mod notification_repo;
pub mod order_repo;
pub mod otp_repo;
pub mod transfer_repo;
pub mod user_repo;

pub use access_grant_repo::AccessGrantRepo;
pub use collaborator_repo::CollaboratorRepo;
pub use event_repo::EventRepo;
pub use module_draft_repo::ModuleDraftRepo;
pub use module_lock_repo::ModuleLockRepo;
pub use module_version_repo::ModuleVersionRepo;
pub use notification_repo::NotificationRepo;
pub use order_repo::OrderRepo;
pub use otp_repo::OtpRepo;
pub use transfer_repo::TransferRepo;
pub use user_repo::UserRepo;
