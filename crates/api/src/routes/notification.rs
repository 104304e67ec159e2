//! Route definitions for notifications.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::notification;
use crate::state::AppState;

/// Notification routes mounted at `/notifications`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(notification::list))
        .route("/{id}/read", post(notification::mark_read))
        .route("/read-all", post(notification::mark_all_read))
        .route("/unread-count", get(notification::unread_count))
}
