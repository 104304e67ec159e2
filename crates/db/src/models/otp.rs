//! OTP code model and DTOs for phone login.

use darbast_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `otp_codes` table. Only the SHA-256 hash of the code
/// is stored.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct OtpCode {
    pub id: DbId,
    pub phone_number: String,
    pub code_hash: String,
    pub expires_at: Timestamp,
    pub consumed_at: Option<Timestamp>,
    pub created_at: Timestamp,
}

/// DTO for requesting a login code.
#[derive(Debug, Deserialize)]
pub struct RequestOtp {
    pub phone_number: String,
}

/// DTO for verifying a login code. `display_name` is required only when
/// the verification doubles as registration (no account yet).
#[derive(Debug, Deserialize)]
pub struct VerifyOtp {
    pub phone_number: String,
    pub code: String,
    pub display_name: Option<String>,
}
