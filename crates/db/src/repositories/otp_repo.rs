//! Repository for the `otp_codes` table.

use sqlx::PgPool;

use crate::models::otp::OtpCode;

/// Column list for `otp_codes` queries.
const COLUMNS: &str = "id, phone_number, code_hash, expires_at, consumed_at, created_at";

/// Provides create/consume operations for one-time login codes.
pub struct OtpRepo;

impl OtpRepo {
    /// Store a new code hash with the given lifetime.
    pub async fn create(
        pool: &PgPool,
        phone_number: &str,
        code_hash: &str,
        expiry_secs: i64,
    ) -> Result<OtpCode, sqlx::Error> {
        let query = format!(
            "INSERT INTO otp_codes (phone_number, code_hash, expires_at) \
             VALUES ($1, $2, NOW() + ($3 || ' seconds')::interval) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, OtpCode>(&query)
            .bind(phone_number)
            .bind(code_hash)
            .bind(expiry_secs.to_string())
            .fetch_one(pool)
            .await
    }

    /// The most recently issued code for a phone number, consumed or not.
    /// Used for the resend cooldown check.
    pub async fn latest_for_phone(
        pool: &PgPool,
        phone_number: &str,
    ) -> Result<Option<OtpCode>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM otp_codes \
             WHERE phone_number = $1 \
             ORDER BY created_at DESC \
             LIMIT 1"
        );
        sqlx::query_as::<_, OtpCode>(&query)
            .bind(phone_number)
            .fetch_optional(pool)
            .await
    }

    /// Atomically consume the newest live code matching the hash.
    ///
    /// Returns `None` when no unconsumed, unexpired code matches -- the
    /// caller cannot distinguish wrong code from expired code, which is
    /// deliberate.
    pub async fn consume(
        pool: &PgPool,
        phone_number: &str,
        code_hash: &str,
    ) -> Result<Option<OtpCode>, sqlx::Error> {
        let query = format!(
            "UPDATE otp_codes SET consumed_at = NOW() \
             WHERE id = ( \
                 SELECT id FROM otp_codes \
                 WHERE phone_number = $1 AND code_hash = $2 \
                   AND consumed_at IS NULL AND expires_at > NOW() \
                 ORDER BY created_at DESC \
                 LIMIT 1 \
             ) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, OtpCode>(&query)
            .bind(phone_number)
            .bind(code_hash)
            .fetch_optional(pool)
            .await
    }

    /// Delete expired codes. Returns the number of rows removed.
    pub async fn cleanup_expired(pool: &PgPool) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM otp_codes WHERE expires_at < NOW()")
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}
