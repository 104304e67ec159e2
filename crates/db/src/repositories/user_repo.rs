//! Repository for the `users` table.

use darbast_core::types::DbId;
use sqlx::PgPool;

use crate::models::user::User;

/// Column list for `users` queries.
const COLUMNS: &str = "id, phone_number, display_name, role, is_active, created_at, updated_at";

/// Provides CRUD operations for user accounts.
pub struct UserRepo;

impl UserRepo {
    /// Create a user with the `customer` role.
    ///
    /// The phone number must already be normalized; the unique constraint
    /// `uq_users_phone_number` is the duplicate backstop.
    pub async fn create(
        pool: &PgPool,
        phone_number: &str,
        display_name: &str,
    ) -> Result<User, sqlx::Error> {
        let query = format!(
            "INSERT INTO users (phone_number, display_name) \
             VALUES ($1, $2) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(phone_number)
            .bind(display_name)
            .fetch_one(pool)
            .await
    }

    /// Find a user by id.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a user by normalized phone number.
    pub async fn find_by_phone(
        pool: &PgPool,
        phone_number: &str,
    ) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE phone_number = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(phone_number)
            .fetch_optional(pool)
            .await
    }

    /// Read a user's current role. Authorization checks call this on
    /// every mutating request instead of trusting cached claims.
    pub async fn get_role(pool: &PgPool, id: DbId) -> Result<Option<String>, sqlx::Error> {
        sqlx::query_scalar("SELECT role FROM users WHERE id = $1 AND is_active = true")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Patch a user's profile fields (admin operation). `None` fields are
    /// left unchanged.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        display_name: Option<&str>,
        role: Option<&str>,
        is_active: Option<bool>,
    ) -> Result<Option<User>, sqlx::Error> {
        let query = format!(
            "UPDATE users SET \
                 display_name = COALESCE($2, display_name), \
                 role = COALESCE($3, role), \
                 is_active = COALESCE($4, is_active), \
                 updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .bind(display_name)
            .bind(role)
            .bind(is_active)
            .fetch_optional(pool)
            .await
    }

    /// List users, newest first (admin operation).
    pub async fn list(pool: &PgPool, limit: i64, offset: i64) -> Result<Vec<User>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM users ORDER BY created_at DESC LIMIT $1 OFFSET $2"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Resolve display names for a set of user ids in one round trip.
    pub async fn display_names(
        pool: &PgPool,
        ids: &[DbId],
    ) -> Result<Vec<(DbId, String)>, sqlx::Error> {
        sqlx::query_as("SELECT id, display_name FROM users WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(pool)
            .await
    }
}
