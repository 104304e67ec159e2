//! Order entity model and DTOs.

use darbast_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `orders` table.
///
/// `status` and `execution_stage` are independent axes: status tracks
/// the approval/payment pipeline, execution_stage the physical work.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Order {
    pub id: DbId,
    pub code: String,
    pub customer_id: DbId,
    pub owner_id: DbId,
    pub status: String,
    pub execution_stage: String,
    pub province: String,
    pub city: String,
    pub address_line: String,
    pub postal_code: Option<String>,
    pub is_archived: bool,
    pub is_deep_archived: bool,
    pub approved_by: Option<DbId>,
    pub executed_by: Option<DbId>,
    pub transferred_from_user_id: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a draft order.
#[derive(Debug, Deserialize)]
pub struct CreateOrder {
    pub province: String,
    pub city: String,
    pub address_line: String,
    pub postal_code: Option<String>,
}

/// DTO for editing a draft order's address fields.
#[derive(Debug, Deserialize)]
pub struct UpdateOrder {
    pub province: Option<String>,
    pub city: Option<String>,
    pub address_line: Option<String>,
    pub postal_code: Option<String>,
}

/// DTO for rejecting a pending order.
#[derive(Debug, Deserialize)]
pub struct RejectOrder {
    pub reason: Option<String>,
}

/// DTO for moving the execution stage.
#[derive(Debug, Deserialize)]
pub struct SetExecutionStage {
    pub stage: String,
}
