//! Repository for the `module_versions` table.
//!
//! Version numbers are strictly increasing per scope and never reused.
//! Two writers racing on the same scope both compute `MAX + 1`; the
//! unique index `uq_module_versions_scope_version` rejects the loser,
//! and [`ModuleVersionRepo::save`] retries the computation a bounded
//! number of times before giving up.

use chrono::NaiveDate;
use darbast_core::types::DbId;
use sqlx::PgPool;

use crate::models::module_version::{ModuleVersion, ModuleVersionSummary};

/// Column list for `module_versions` queries.
const COLUMNS: &str = "id, module_key, module_date, version, payload, created_by, created_at";

/// Column list for payload-less listings.
const SUMMARY_COLUMNS: &str = "id, module_key, module_date, version, created_by, created_at";

/// How many times a save retries after losing a version-number race.
const SAVE_RETRIES: u32 = 3;

/// Provides append/read operations for immutable version snapshots.
pub struct ModuleVersionRepo;

impl ModuleVersionRepo {
    /// Append a snapshot with the next version number for the scope.
    ///
    /// Restores go through here too: saving an older payload again
    /// creates a new, higher version -- the counter never rewinds.
    pub async fn save(
        pool: &PgPool,
        module_key: &str,
        module_date: Option<NaiveDate>,
        payload: &serde_json::Value,
        created_by: DbId,
    ) -> Result<ModuleVersion, sqlx::Error> {
        let query = format!(
            "INSERT INTO module_versions (module_key, module_date, version, payload, created_by) \
             SELECT $1, $2, COALESCE(MAX(version), 0) + 1, $3, $4 \
             FROM module_versions \
             WHERE module_key = $1 \
               AND COALESCE(module_date, DATE '0001-01-01') = COALESCE($2, DATE '0001-01-01') \
             RETURNING {COLUMNS}"
        );

        let mut attempt = 0;
        loop {
            let result = sqlx::query_as::<_, ModuleVersion>(&query)
                .bind(module_key)
                .bind(module_date)
                .bind(payload)
                .bind(created_by)
                .fetch_one(pool)
                .await;

            match result {
                Ok(version) => return Ok(version),
                Err(e) if is_version_race(&e) && attempt < SAVE_RETRIES => {
                    attempt += 1;
                    tracing::debug!(
                        module_key,
                        attempt,
                        "Version number race, retrying save"
                    );
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Fetch one exact version of a scope.
    pub async fn find(
        pool: &PgPool,
        module_key: &str,
        module_date: Option<NaiveDate>,
        version: i32,
    ) -> Result<Option<ModuleVersion>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM module_versions \
             WHERE module_key = $1 \
               AND COALESCE(module_date, DATE '0001-01-01') = COALESCE($2, DATE '0001-01-01') \
               AND version = $3"
        );
        sqlx::query_as::<_, ModuleVersion>(&query)
            .bind(module_key)
            .bind(module_date)
            .bind(version)
            .fetch_optional(pool)
            .await
    }

    /// List versions newest-first. The limit is caller policy; this repo
    /// imposes no cap of its own.
    pub async fn list(
        pool: &PgPool,
        module_key: &str,
        module_date: Option<NaiveDate>,
        limit: i64,
    ) -> Result<Vec<ModuleVersionSummary>, sqlx::Error> {
        let query = format!(
            "SELECT {SUMMARY_COLUMNS} FROM module_versions \
             WHERE module_key = $1 \
               AND COALESCE(module_date, DATE '0001-01-01') = COALESCE($2, DATE '0001-01-01') \
             ORDER BY version DESC \
             LIMIT $3"
        );
        sqlx::query_as::<_, ModuleVersionSummary>(&query)
            .bind(module_key)
            .bind(module_date)
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    /// The latest version number for a scope (0 if none exist).
    pub async fn latest_version_number(
        pool: &PgPool,
        module_key: &str,
        module_date: Option<NaiveDate>,
    ) -> Result<i32, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT COALESCE(MAX(version), 0) FROM module_versions \
             WHERE module_key = $1 \
               AND COALESCE(module_date, DATE '0001-01-01') = COALESCE($2, DATE '0001-01-01')",
        )
        .bind(module_key)
        .bind(module_date)
        .fetch_one(pool)
        .await
    }
}

/// True when the error is the scope+version unique index firing.
fn is_version_race(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => {
            db_err.code().as_deref() == Some("23505")
                && db_err.constraint() == Some("uq_module_versions_scope_version")
        }
        _ => false,
    }
}
