//! Admin handlers for the contractor whitelist.
//!
//! A grant is the structured pair (position, service scope); a missing
//! scope means "all scopes". Display names come from the lookup tables
//! at read time.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use darbast_core::error::CoreError;
use darbast_core::roles;
use darbast_core::types::DbId;
use darbast_db::models::access_grant::CreateAccessGrant;
use darbast_db::repositories::AccessGrantRepo;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

use super::require_role;

/// POST /api/v1/admin/grants
pub async fn create(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateAccessGrant>,
) -> AppResult<impl IntoResponse> {
    require_role(&state.pool, auth.user_id, roles::can_close_orders).await?;

    // Duplicate combinations trip uq_access_grants_combo -> Conflict.
    let grant = AccessGrantRepo::create(
        &state.pool,
        input.user_id,
        input.position_id,
        input.service_scope_id,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: grant })))
}

/// GET /api/v1/admin/users/{id}/grants
pub async fn list_for_user(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(user_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    require_role(&state.pool, auth.user_id, roles::is_manager).await?;

    let grants = AccessGrantRepo::list_for_user(&state.pool, user_id).await?;
    Ok(Json(DataResponse { data: grants }))
}

/// DELETE /api/v1/admin/grants/{id}
pub async fn delete(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(grant_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    require_role(&state.pool, auth.user_id, roles::can_close_orders).await?;

    let deleted = AccessGrantRepo::delete(&state.pool, grant_id).await?;
    if !deleted {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "AccessGrant",
            id: grant_id,
        }));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/admin/positions
pub async fn list_positions(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    require_role(&state.pool, auth.user_id, roles::is_manager).await?;
    let positions = AccessGrantRepo::list_positions(&state.pool).await?;
    Ok(Json(DataResponse { data: positions }))
}

/// GET /api/v1/admin/service-scopes
pub async fn list_service_scopes(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    require_role(&state.pool, auth.user_id, roles::is_manager).await?;
    let scopes = AccessGrantRepo::list_service_scopes(&state.pool).await?;
    Ok(Json(DataResponse { data: scopes }))
}
