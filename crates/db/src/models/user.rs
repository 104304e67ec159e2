//! User entity model and DTOs.

use darbast_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `users` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct User {
    pub id: DbId,
    pub phone_number: String,
    pub display_name: String,
    pub role: String,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a user (registration via OTP verification).
#[derive(Debug, Deserialize)]
pub struct CreateUser {
    pub phone_number: String,
    pub display_name: String,
}

/// DTO for an admin updating a user.
#[derive(Debug, Deserialize)]
pub struct UpdateUser {
    pub display_name: Option<String>,
    pub role: Option<String>,
    pub is_active: Option<bool>,
}
