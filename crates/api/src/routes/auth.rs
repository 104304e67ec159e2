//! Route definitions for phone OTP authentication.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::auth;
use crate::state::AppState;

/// Auth routes mounted at `/auth`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/otp/request", post(auth::request_otp))
        .route("/otp/verify", post(auth::verify_otp))
        .route("/me", get(auth::me))
        .route("/me/capabilities", get(auth::capabilities))
}
