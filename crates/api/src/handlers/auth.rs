//! Handlers for phone OTP login and identity endpoints.
//!
//! `request_otp` issues a short-lived code through the SMS boundary;
//! `verify_otp` consumes it and either logs the user in or registers
//! them. Registration also attaches the new account to any transfer
//! requests or collaborator invites parked on the phone number.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use darbast_core::error::CoreError;
use darbast_core::otp::{
    generate_code, hash_code, OTP_EXPIRY_SECS, OTP_RESEND_COOLDOWN_SECS,
};
use darbast_core::phone::normalize_and_validate;
use darbast_core::roles;
use darbast_db::models::otp::{RequestOtp, VerifyOtp};
use darbast_db::models::user::User;
use darbast_db::repositories::{CollaboratorRepo, OtpRepo, TransferRepo, UserRepo};
use darbast_events::PlatformEvent;

use crate::auth::jwt::generate_access_token;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/v1/auth/otp/request
///
/// Issue a login code for a phone number. Rate-limited per phone by the
/// resend cooldown. Always answers 200 with the expiry window, whether
/// or not an account exists for the number.
pub async fn request_otp(
    State(state): State<AppState>,
    Json(input): Json<RequestOtp>,
) -> AppResult<impl IntoResponse> {
    let phone = normalize_and_validate(&input.phone_number)
        .map_err(|e| AppError::Core(CoreError::Validation(e)))?;

    if let Some(last) = OtpRepo::latest_for_phone(&state.pool, &phone).await? {
        let elapsed = chrono::Utc::now() - last.created_at;
        if elapsed.num_seconds() < OTP_RESEND_COOLDOWN_SECS {
            return Err(AppError::Core(CoreError::Conflict(
                "A code was sent recently, please wait before requesting another".into(),
            )));
        }
    }

    let code = generate_code();
    OtpRepo::create(&state.pool, &phone, &hash_code(&code), OTP_EXPIRY_SECS).await?;

    if let Err(e) = state
        .sms
        .send(&phone, &format!("Your Darbast login code: {code}"))
        .await
    {
        // The code row stays valid; the user can request a resend after
        // the cooldown if the message never arrives.
        tracing::warn!(error = %e, "SMS delivery failed");
    }

    Ok(Json(DataResponse {
        data: serde_json::json!({ "expires_in_secs": OTP_EXPIRY_SECS }),
    }))
}

/// POST /api/v1/auth/otp/verify
///
/// Consume a login code. Logs in an existing account, or registers a new
/// `customer` account when `display_name` is provided. Registration
/// promotes transfer requests parked on the number and attaches pending
/// collaborator invites.
pub async fn verify_otp(
    State(state): State<AppState>,
    Json(input): Json<VerifyOtp>,
) -> AppResult<impl IntoResponse> {
    let phone = normalize_and_validate(&input.phone_number)
        .map_err(|e| AppError::Core(CoreError::Validation(e)))?;

    let consumed = OtpRepo::consume(&state.pool, &phone, &hash_code(&input.code)).await?;
    if consumed.is_none() {
        // Wrong, expired, and already-used codes are indistinguishable
        // on purpose.
        return Err(AppError::Core(CoreError::Unauthorized(
            "Invalid or expired code".into(),
        )));
    }

    let user = match UserRepo::find_by_phone(&state.pool, &phone).await? {
        Some(user) if user.is_active => user,
        Some(_) => {
            return Err(AppError::Core(CoreError::Forbidden(
                super::FORBIDDEN_MSG.into(),
            )))
        }
        None => register(&state, &phone, input.display_name.as_deref()).await?,
    };

    let token = generate_access_token(user.id, &user.role, &state.config.jwt)
        .map_err(|e| AppError::InternalError(format!("Token generation failed: {e}")))?;

    Ok(Json(DataResponse {
        data: serde_json::json!({ "access_token": token, "user": user }),
    }))
}

/// Create the account and wire up everything waiting on the number.
async fn register(
    state: &AppState,
    phone: &str,
    display_name: Option<&str>,
) -> AppResult<User> {
    let Some(display_name) = display_name.filter(|n| !n.trim().is_empty()) else {
        return Err(AppError::Core(CoreError::Validation(
            "display_name is required for first-time registration".into(),
        )));
    };

    let user = UserRepo::create(&state.pool, phone, display_name.trim()).await?;

    let promoted = TransferRepo::attach_registered_user(&state.pool, phone, user.id).await?;
    let attached = CollaboratorRepo::attach_registered_user(&state.pool, phone, user.id).await?;
    if promoted > 0 || attached > 0 {
        tracing::info!(
            user_id = user.id,
            promoted_transfers = promoted,
            attached_invites = attached,
            "Registration matched parked rows"
        );
    }

    state.event_bus.publish(
        PlatformEvent::new("user.registered")
            .with_source("user", user.id)
            .with_actor(user.id),
    );

    Ok(user)
}

/// GET /api/v1/auth/me
///
/// The authenticated user's own profile.
pub async fn me(auth: AuthUser, State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let user = UserRepo::find_by_id(&state.pool, auth.user_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "User",
            id: auth.user_id,
        }))?;
    Ok(Json(DataResponse { data: user }))
}

/// GET /api/v1/auth/me/capabilities
///
/// UI visibility hints derived from the cached role. Non-authoritative:
/// every operation re-checks permissions server-side, so these flags
/// only drive what the client bothers to render.
pub async fn capabilities(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let role = state
        .role_cache
        .get(&state.pool, auth.user_id)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::Forbidden(super::FORBIDDEN_MSG.into())))?;

    Ok(Json(DataResponse {
        data: serde_json::json!({
            "role": role,
            "can_review_orders": roles::can_review_orders(&role),
            "can_execute_orders": roles::can_execute_orders(&role),
            "can_settle_orders": roles::can_settle_orders(&role),
            "can_close_orders": roles::can_close_orders(&role),
            "can_edit_modules": roles::can_edit_modules(&role),
        }),
    }))
}
