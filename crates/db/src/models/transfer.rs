//! Transfer request entity model and DTOs.

use darbast_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `transfer_requests` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct TransferRequest {
    pub id: DbId,
    pub order_id: DbId,
    pub from_user_id: DbId,
    /// `None` until the recipient has an account (pending_registration).
    pub to_user_id: Option<DbId>,
    pub to_phone_number: String,
    pub status: String,
    pub approved_by: Option<DbId>,
    pub manager_responded_at: Option<Timestamp>,
    pub manager_reject_reason: Option<String>,
    pub recipient_responded_at: Option<Timestamp>,
    pub recipient_reject_reason: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a transfer request.
#[derive(Debug, Deserialize)]
pub struct CreateTransferRequest {
    pub to_phone_number: String,
}

/// DTO for a manager or recipient rejecting a request.
#[derive(Debug, Deserialize)]
pub struct RejectTransferRequest {
    pub reason: Option<String>,
}
