//! Repository for the `module_locks` table.
//!
//! A lock row exists exactly while the scope is held. Acquisition by a
//! new holder while another holds the scope is a forced takeover, never
//! a denial; the takeover orchestration (auto-save first) lives in the
//! API layer, this repo only provides the race-safe primitives.

use chrono::NaiveDate;
use darbast_core::types::DbId;
use sqlx::PgPool;

use crate::models::module_lock::ModuleLock;

/// Column list for `module_locks` queries.
const COLUMNS: &str = "id, module_key, module_date, holder_id, acquired_at";

/// Provides mutual-exclusion primitives for module scopes.
pub struct ModuleLockRepo;

impl ModuleLockRepo {
    /// The current lock for a scope, or `None` if unlocked.
    pub async fn get(
        pool: &PgPool,
        module_key: &str,
        module_date: Option<NaiveDate>,
    ) -> Result<Option<ModuleLock>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM module_locks \
             WHERE module_key = $1 \
               AND COALESCE(module_date, DATE '0001-01-01') = COALESCE($2, DATE '0001-01-01')"
        );
        sqlx::query_as::<_, ModuleLock>(&query)
            .bind(module_key)
            .bind(module_date)
            .fetch_optional(pool)
            .await
    }

    /// Attempt to create the lock for an unlocked scope.
    ///
    /// Uses `INSERT ... ON CONFLICT DO NOTHING` against the scope's
    /// unique index; `None` means someone already holds the scope and
    /// the caller must go down the takeover path.
    pub async fn try_insert(
        pool: &PgPool,
        module_key: &str,
        module_date: Option<NaiveDate>,
        holder_id: DbId,
    ) -> Result<Option<ModuleLock>, sqlx::Error> {
        let query = format!(
            "INSERT INTO module_locks (module_key, module_date, holder_id) \
             VALUES ($1, $2, $3) \
             ON CONFLICT (module_key, COALESCE(module_date, DATE '0001-01-01')) \
             DO NOTHING \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ModuleLock>(&query)
            .bind(module_key)
            .bind(module_date)
            .bind(holder_id)
            .fetch_optional(pool)
            .await
    }

    /// Reassign the lock from a specific previous holder to a new one.
    ///
    /// Guarding on the previous holder keeps two concurrent takeovers
    /// from both believing they displaced the same session; the loser
    /// gets `None` and re-reads the lock.
    pub async fn take_over(
        pool: &PgPool,
        module_key: &str,
        module_date: Option<NaiveDate>,
        previous_holder_id: DbId,
        new_holder_id: DbId,
    ) -> Result<Option<ModuleLock>, sqlx::Error> {
        let query = format!(
            "UPDATE module_locks SET holder_id = $4, acquired_at = NOW() \
             WHERE module_key = $1 \
               AND COALESCE(module_date, DATE '0001-01-01') = COALESCE($2, DATE '0001-01-01') \
               AND holder_id = $3 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ModuleLock>(&query)
            .bind(module_key)
            .bind(module_date)
            .bind(previous_holder_id)
            .bind(new_holder_id)
            .fetch_optional(pool)
            .await
    }

    /// Clear the lock. Only the holder's delete matches; releasing a
    /// scope you no longer hold (including a double release) affects
    /// zero rows and returns `false`.
    pub async fn release(
        pool: &PgPool,
        module_key: &str,
        module_date: Option<NaiveDate>,
        holder_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM module_locks \
             WHERE module_key = $1 \
               AND COALESCE(module_date, DATE '0001-01-01') = COALESCE($2, DATE '0001-01-01') \
               AND holder_id = $3",
        )
        .bind(module_key)
        .bind(module_date)
        .bind(holder_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
