use std::sync::Arc;

use crate::auth::sms::SmsSender;
use crate::config::ServerConfig;
use crate::roles_cache::RoleCache;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: darbast_db::DbPool,
    /// Server configuration (accessed by middleware and handlers).
    pub config: Arc<ServerConfig>,
    /// Centralized event bus for publishing platform events.
    pub event_bus: Arc<darbast_events::EventBus>,
    /// Outbound SMS provider (OTP delivery).
    pub sms: Arc<dyn SmsSender>,
    /// Short-TTL role hint cache. UI hints only -- authorization re-reads
    /// the `users` table.
    pub role_cache: Arc<RoleCache>,
}
