//! Repository for the `access_grants` table and its lookup tables.
//!
//! A grant is the structured pair (position, service scope); display
//! names are resolved at read time by joining the lookup tables, never
//! stored as formatted strings.

use darbast_core::types::DbId;
use sqlx::PgPool;

use crate::models::access_grant::{AccessGrant, AccessGrantWithNames};

/// Column list for `access_grants` queries.
const COLUMNS: &str = "id, user_id, position_id, service_scope_id, created_at";

/// An `id, name` row from a lookup table.
#[derive(Debug, Clone, sqlx::FromRow, serde::Serialize)]
pub struct LookupRow {
    pub id: DbId,
    pub name: String,
}

/// Provides CRUD operations for contractor whitelist grants.
pub struct AccessGrantRepo;

impl AccessGrantRepo {
    /// Create a grant. A duplicate combination trips
    /// `uq_access_grants_combo` for the caller to map.
    pub async fn create(
        pool: &PgPool,
        user_id: DbId,
        position_id: DbId,
        service_scope_id: Option<DbId>,
    ) -> Result<AccessGrant, sqlx::Error> {
        let query = format!(
            "INSERT INTO access_grants (user_id, position_id, service_scope_id) \
             VALUES ($1, $2, $3) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, AccessGrant>(&query)
            .bind(user_id)
            .bind(position_id)
            .bind(service_scope_id)
            .fetch_one(pool)
            .await
    }

    /// All grants for a user with display names resolved.
    pub async fn list_for_user(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Vec<AccessGrantWithNames>, sqlx::Error> {
        let query = "SELECT g.id, g.user_id, g.position_id, p.name AS position_name, \
                            g.service_scope_id, s.name AS service_scope_name, g.created_at \
                     FROM access_grants g \
                     JOIN positions p ON p.id = g.position_id \
                     LEFT JOIN service_scopes s ON s.id = g.service_scope_id \
                     WHERE g.user_id = $1 \
                     ORDER BY g.created_at ASC";
        sqlx::query_as::<_, AccessGrantWithNames>(query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    /// Delete a grant. Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM access_grants WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// All known organizational positions.
    pub async fn list_positions(pool: &PgPool) -> Result<Vec<LookupRow>, sqlx::Error> {
        sqlx::query_as::<_, LookupRow>("SELECT id, name FROM positions ORDER BY name")
            .fetch_all(pool)
            .await
    }

    /// All known service scopes.
    pub async fn list_service_scopes(pool: &PgPool) -> Result<Vec<LookupRow>, sqlx::Error> {
        sqlx::query_as::<_, LookupRow>("SELECT id, name FROM service_scopes ORDER BY name")
            .fetch_all(pool)
            .await
    }
}
