//! Handlers for module version history.
//!
//! Versions are append-only; a restore loads an older payload and saves
//! it as a new, higher version. The listing default of 10 is handler
//! policy -- the repository imposes no cap of its own.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::NaiveDate;
use darbast_core::error::CoreError;
use darbast_core::modules::validate_module_scope;
use darbast_core::roles;
use darbast_db::models::module_version::SaveVersionRequest;
use darbast_db::repositories::{ModuleLockRepo, ModuleVersionRepo};
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

use super::locks::publish_version_saved;
use super::require_role;

/// Default number of versions returned by the listing endpoint.
const DEFAULT_LIST_LIMIT: i64 = 10;

/// Query parameters addressing a module scope.
#[derive(Debug, Deserialize)]
pub struct VersionScopeQuery {
    pub module_key: String,
    pub module_date: Option<NaiveDate>,
    pub limit: Option<i64>,
}

/// POST /api/v1/modules/versions
///
/// Save an explicit version snapshot. When the scope is locked, only the
/// holder may save.
pub async fn save(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<SaveVersionRequest>,
) -> AppResult<impl IntoResponse> {
    require_role(&state.pool, auth.user_id, roles::can_edit_modules).await?;
    validate_module_scope(&input.module_key, input.module_date)
        .map_err(|e| AppError::Core(CoreError::Validation(e)))?;

    if let Some(lock) =
        ModuleLockRepo::get(&state.pool, &input.module_key, input.module_date).await?
    {
        if lock.holder_id != auth.user_id {
            return Err(AppError::Core(CoreError::Conflict(
                "The module is locked by another user".into(),
            )));
        }
    }

    let version = ModuleVersionRepo::save(
        &state.pool,
        &input.module_key,
        input.module_date,
        &input.payload,
        auth.user_id,
    )
    .await?;
    publish_version_saved(&state, &input.module_key, input.module_date, version.version);

    Ok((StatusCode::CREATED, Json(DataResponse { data: version })))
}

/// GET /api/v1/modules/versions
///
/// List a scope's versions, newest first.
pub async fn list(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<VersionScopeQuery>,
) -> AppResult<impl IntoResponse> {
    require_role(&state.pool, auth.user_id, roles::can_edit_modules).await?;
    validate_module_scope(&params.module_key, params.module_date)
        .map_err(|e| AppError::Core(CoreError::Validation(e)))?;

    let limit = params.limit.unwrap_or(DEFAULT_LIST_LIMIT);
    let versions =
        ModuleVersionRepo::list(&state.pool, &params.module_key, params.module_date, limit).await?;
    Ok(Json(DataResponse { data: versions }))
}

/// GET /api/v1/modules/versions/{version}
///
/// Load one exact version's payload.
pub async fn load(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(version): Path<i32>,
    Query(params): Query<VersionScopeQuery>,
) -> AppResult<impl IntoResponse> {
    require_role(&state.pool, auth.user_id, roles::can_edit_modules).await?;
    validate_module_scope(&params.module_key, params.module_date)
        .map_err(|e| AppError::Core(CoreError::Validation(e)))?;

    let row = ModuleVersionRepo::find(&state.pool, &params.module_key, params.module_date, version)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "ModuleVersion",
            id: version as i64,
        }))?;
    Ok(Json(DataResponse { data: row }))
}

/// POST /api/v1/modules/versions/{version}/restore
///
/// Re-save an older payload as a brand-new version. The counter never
/// rewinds and no forward history is deleted.
pub async fn restore(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(version): Path<i32>,
    Query(params): Query<VersionScopeQuery>,
) -> AppResult<impl IntoResponse> {
    require_role(&state.pool, auth.user_id, roles::can_edit_modules).await?;
    validate_module_scope(&params.module_key, params.module_date)
        .map_err(|e| AppError::Core(CoreError::Validation(e)))?;

    if let Some(lock) =
        ModuleLockRepo::get(&state.pool, &params.module_key, params.module_date).await?
    {
        if lock.holder_id != auth.user_id {
            return Err(AppError::Core(CoreError::Conflict(
                "The module is locked by another user".into(),
            )));
        }
    }

    let old = ModuleVersionRepo::find(&state.pool, &params.module_key, params.module_date, version)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "ModuleVersion",
            id: version as i64,
        }))?;

    let restored = ModuleVersionRepo::save(
        &state.pool,
        &params.module_key,
        params.module_date,
        &old.payload,
        auth.user_id,
    )
    .await?;
    publish_version_saved(
        &state,
        &params.module_key,
        params.module_date,
        restored.version,
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: restored })))
}
