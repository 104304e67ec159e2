//! Route definitions for transfer request gates.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::transfers;
use crate::state::AppState;

/// Transfer routes mounted at `/transfers`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/pending", get(transfers::list_pending))
        .route("/incoming", get(transfers::list_incoming))
        .route("/{id}/approve", post(transfers::approve))
        .route("/{id}/reject", post(transfers::reject))
        .route("/{id}/accept", post(transfers::accept))
        .route("/{id}/decline", post(transfers::decline))
}
