//! Module lock and draft models and DTOs.

use chrono::NaiveDate;
use darbast_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `module_locks` table. Existence of a row means the
/// scope is locked; there is no inactive state.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ModuleLock {
    pub id: DbId,
    pub module_key: String,
    pub module_date: Option<NaiveDate>,
    pub holder_id: DbId,
    pub acquired_at: Timestamp,
}

/// A row from the `module_drafts` table: the holder's unsaved working
/// copy of a module, upserted while editing.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ModuleDraft {
    pub id: DbId,
    pub module_key: String,
    pub module_date: Option<NaiveDate>,
    pub payload: serde_json::Value,
    pub edited_by: DbId,
    pub updated_at: Timestamp,
}

/// DTO addressing a module scope (acquire, release, status).
#[derive(Debug, Deserialize)]
pub struct ModuleScopeRequest {
    pub module_key: String,
    pub module_date: Option<NaiveDate>,
}

/// DTO for writing the in-flight draft payload.
#[derive(Debug, Deserialize)]
pub struct SaveDraftRequest {
    pub module_key: String,
    pub module_date: Option<NaiveDate>,
    pub payload: serde_json::Value,
}
