//! Periodic cleanup of expired OTP codes.
//!
//! Spawns a background task that deletes rows from `otp_codes` past
//! their expiry. Consumed and expired codes carry no value and the
//! table would otherwise grow with every login attempt.

use std::time::Duration;

use darbast_db::repositories::OtpRepo;
use sqlx::PgPool;
use tokio_util::sync::CancellationToken;

/// How often the cleanup job runs.
const CLEANUP_INTERVAL: Duration = Duration::from_secs(3600); // 1 hour

/// Run the OTP cleanup loop until `cancel` is triggered.
pub async fn run(pool: PgPool, cancel: CancellationToken) {
    tracing::info!(
        interval_secs = CLEANUP_INTERVAL.as_secs(),
        "OTP cleanup job started"
    );

    let mut interval = tokio::time::interval(CLEANUP_INTERVAL);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("OTP cleanup job stopping");
                break;
            }
            _ = interval.tick() => {
                match OtpRepo::cleanup_expired(&pool).await {
                    Ok(0) => {}
                    Ok(removed) => {
                        tracing::debug!(removed, "Expired OTP codes removed");
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "OTP cleanup failed, will retry");
                    }
                }
            }
        }
    }
}
