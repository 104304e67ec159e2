//! Route definitions for module locks, drafts, and version history.

use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::{locks, versions};
use crate::state::AppState;

/// Module routes mounted at `/modules`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/locks/acquire", post(locks::acquire))
        .route("/locks/release", post(locks::release))
        .route("/locks/status", get(locks::status))
        .route("/draft", put(locks::save_draft))
        .route("/versions", get(versions::list).post(versions::save))
        .route("/versions/{version}", get(versions::load))
        .route("/versions/{version}/restore", post(versions::restore))
}
