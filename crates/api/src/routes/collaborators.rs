//! Route definitions for collaborator responses and removal.

use axum::routing::{delete, post};
use axum::Router;

use crate::handlers::collaborators;
use crate::state::AppState;

/// Collaborator routes mounted at `/collaborators`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{id}/respond", post(collaborators::respond))
        .route("/{id}", delete(collaborators::remove))
        .route("/{id}/revoke", delete(collaborators::revoke))
}
