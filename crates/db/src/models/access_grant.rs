//! Contractor whitelist grant models and DTOs.

use darbast_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `access_grants` table. A `service_scope_id` of `None`
/// grants every scope for the position.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AccessGrant {
    pub id: DbId,
    pub user_id: DbId,
    pub position_id: DbId,
    pub service_scope_id: Option<DbId>,
    pub created_at: Timestamp,
}

/// A grant joined with its display names, resolved at read time.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AccessGrantWithNames {
    pub id: DbId,
    pub user_id: DbId,
    pub position_id: DbId,
    pub position_name: String,
    pub service_scope_id: Option<DbId>,
    /// `None` means the grant covers all scopes.
    pub service_scope_name: Option<String>,
    pub created_at: Timestamp,
}

/// DTO for creating a grant.
#[derive(Debug, Deserialize)]
pub struct CreateAccessGrant {
    pub user_id: DbId,
    pub position_id: DbId,
    /// Omit to grant all service scopes.
    pub service_scope_id: Option<DbId>,
}
