//! Repository for the `module_drafts` table.
//!
//! One draft row per scope: the lock holder's in-flight edits, upserted
//! as they type. The takeover and release paths snapshot it into
//! `module_versions`.

use chrono::NaiveDate;
use darbast_core::types::DbId;
use sqlx::PgPool;

use crate::models::module_lock::ModuleDraft;

/// Column list for `module_drafts` queries.
const COLUMNS: &str = "id, module_key, module_date, payload, edited_by, updated_at";

/// Provides upsert/read operations for in-flight module drafts.
pub struct ModuleDraftRepo;

impl ModuleDraftRepo {
    /// Write (or overwrite) the scope's draft.
    pub async fn upsert(
        pool: &PgPool,
        module_key: &str,
        module_date: Option<NaiveDate>,
        payload: &serde_json::Value,
        edited_by: DbId,
    ) -> Result<ModuleDraft, sqlx::Error> {
        let query = format!(
            "INSERT INTO module_drafts (module_key, module_date, payload, edited_by) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT (module_key, COALESCE(module_date, DATE '0001-01-01')) \
             DO UPDATE SET payload = $3, edited_by = $4, updated_at = NOW() \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ModuleDraft>(&query)
            .bind(module_key)
            .bind(module_date)
            .bind(payload)
            .bind(edited_by)
            .fetch_one(pool)
            .await
    }

    /// The scope's current draft, if any.
    pub async fn get(
        pool: &PgPool,
        module_key: &str,
        module_date: Option<NaiveDate>,
    ) -> Result<Option<ModuleDraft>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM module_drafts \
             WHERE module_key = $1 \
               AND COALESCE(module_date, DATE '0001-01-01') = COALESCE($2, DATE '0001-01-01')"
        );
        sqlx::query_as::<_, ModuleDraft>(&query)
            .bind(module_key)
            .bind(module_date)
            .fetch_optional(pool)
            .await
    }

    /// Drop the scope's draft (after it has been snapshotted).
    pub async fn clear(
        pool: &PgPool,
        module_key: &str,
        module_date: Option<NaiveDate>,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM module_drafts \
             WHERE module_key = $1 \
               AND COALESCE(module_date, DATE '0001-01-01') = COALESCE($2, DATE '0001-01-01')",
        )
        .bind(module_key)
        .bind(module_date)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
