//! Darbast event bus and notification infrastructure.
//!
//! Building blocks for the platform-wide event system:
//!
//! - [`EventBus`] -- in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`.
//! - [`PlatformEvent`] -- the canonical domain event envelope.
//! - [`EventPersistence`] -- background service that durably writes every
//!   event to the `events` table.
//! - [`Notifier`] -- fire-and-forget in-app notification writer.

pub mod bus;
pub mod notifier;
pub mod persistence;

pub use bus::{EventBus, PlatformEvent};
pub use notifier::Notifier;
pub use persistence::EventPersistence;
