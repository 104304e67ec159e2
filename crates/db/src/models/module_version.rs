//! Module version snapshot model and DTOs.

use chrono::NaiveDate;
use darbast_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `module_versions` table. Immutable once written.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ModuleVersion {
    pub id: DbId,
    pub module_key: String,
    pub module_date: Option<NaiveDate>,
    pub version: i32,
    pub payload: serde_json::Value,
    pub created_by: DbId,
    pub created_at: Timestamp,
}

/// A version listing entry without the payload (listings can be long;
/// payloads are fetched one at a time).
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ModuleVersionSummary {
    pub id: DbId,
    pub module_key: String,
    pub module_date: Option<NaiveDate>,
    pub version: i32,
    pub created_by: DbId,
    pub created_at: Timestamp,
}

/// DTO for saving a new version snapshot.
#[derive(Debug, Deserialize)]
pub struct SaveVersionRequest {
    pub module_key: String,
    pub module_date: Option<NaiveDate>,
    pub payload: serde_json::Value,
}
