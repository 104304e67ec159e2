//! Outbound SMS provider boundary.
//!
//! The actual gateway (delivery, retries, sender IDs) is an external
//! collaborator; the API only needs "send this text to this number".
//! A tracing implementation ships for development and tests.

use async_trait::async_trait;

/// Something that can deliver a short text message to a phone number.
#[async_trait]
pub trait SmsSender: Send + Sync {
    /// Deliver `body` to the (normalized) `phone_number`.
    ///
    /// Errors are strings because the provider's failure detail is only
    /// ever logged, never surfaced to end users.
    async fn send(&self, phone_number: &str, body: &str) -> Result<(), String>;
}

/// Development sender: logs the message instead of delivering it.
pub struct TracingSms;

#[async_trait]
impl SmsSender for TracingSms {
    async fn send(&self, phone_number: &str, body: &str) -> Result<(), String> {
        tracing::info!(phone_number, body, "SMS (dev sender, not delivered)");
        Ok(())
    }
}
