//! Route definitions for orders and their nested resources.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{collaborators, orders, ownership, transfers};
use crate::state::AppState;

/// Order routes mounted at `/orders`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::list_orders).post(orders::create_order))
        .route("/queue", get(orders::list_queue))
        .route("/{id}", get(orders::get_order).patch(orders::update_order))
        .route("/{id}/submit", post(orders::submit_order))
        .route("/{id}/approve", post(orders::approve_order))
        .route("/{id}/reject", post(orders::reject_order))
        .route("/{id}/schedule", post(orders::schedule_execution))
        .route("/{id}/start", post(orders::start_work))
        .route("/{id}/complete", post(orders::complete_order))
        .route("/{id}/pay", post(orders::mark_paid))
        .route("/{id}/close", post(orders::close_order))
        .route("/{id}/stage", post(orders::set_execution_stage))
        .route("/{id}/archive", post(orders::archive_order))
        .route("/{id}/deep-archive", post(orders::deep_archive_order))
        .route(
            "/{id}/transfers",
            get(transfers::list_for_order).post(transfers::create_transfer),
        )
        .route(
            "/{id}/collaborators",
            get(collaborators::list).post(collaborators::invite),
        )
        .route("/{id}/ownership-chain", get(ownership::get_chain))
        .route("/{id}/events", get(orders::list_events))
}
