//! Fire-and-forget in-app notification writer.
//!
//! State transitions that owe someone a heads-up (transfer answered,
//! invite received, lock taken over) call [`Notifier::send`] after the
//! transition has committed. A notification failure is logged and
//! swallowed -- it must never roll back or fail the operation that
//! triggered it.

use darbast_core::types::DbId;
use darbast_db::repositories::NotificationRepo;
use darbast_db::DbPool;

use crate::bus::PlatformEvent;
use crate::EventBus;

/// Writes notification rows and mirrors them onto the event bus.
pub struct Notifier;

impl Notifier {
    /// Create a notification for a user. Best-effort by contract.
    pub async fn send(
        pool: &DbPool,
        bus: &EventBus,
        user_id: DbId,
        title: &str,
        body: &str,
        link: Option<&str>,
        severity: &str,
    ) {
        match NotificationRepo::create(pool, user_id, title, body, link, severity).await {
            Ok(notification_id) => {
                bus.publish(
                    PlatformEvent::new("notification.created")
                        .with_source("notification", notification_id)
                        .with_payload(serde_json::json!({
                            "user_id": user_id,
                            "title": title,
                            "severity": severity,
                        })),
                );
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    user_id,
                    title,
                    "Failed to create notification, continuing"
                );
            }
        }
    }
}
