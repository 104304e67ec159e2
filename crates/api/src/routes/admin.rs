//! Route definitions for admin endpoints (users, whitelist grants).

use axum::routing::{delete, get, patch, post};
use axum::Router;

use crate::handlers::{access_grants, admin};
use crate::state::AppState;

/// Admin routes mounted at `/admin`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users", get(admin::list_users))
        .route("/users/{id}", patch(admin::update_user))
        .route("/users/{id}/grants", get(access_grants::list_for_user))
        .route("/grants", post(access_grants::create))
        .route("/grants/{id}", delete(access_grants::delete))
        .route("/positions", get(access_grants::list_positions))
        .route("/service-scopes", get(access_grants::list_service_scopes))
}
