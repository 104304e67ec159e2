//! Admin handlers for user management.

use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::Json;
use darbast_core::error::CoreError;
use darbast_core::roles::{self, is_valid_role};
use darbast_core::types::DbId;
use darbast_db::models::user::UpdateUser;
use darbast_db::repositories::UserRepo;
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

use super::require_role;

/// Query parameters for `GET /admin/users`.
#[derive(Debug, Deserialize)]
pub struct UserListQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

const MAX_LIMIT: i64 = 100;
const DEFAULT_LIMIT: i64 = 50;

/// GET /api/v1/admin/users
pub async fn list_users(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<UserListQuery>,
) -> AppResult<impl IntoResponse> {
    require_role(&state.pool, auth.user_id, roles::can_close_orders).await?;

    let limit = params.limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT);
    let offset = params.offset.unwrap_or(0);
    let users = UserRepo::list(&state.pool, limit, offset).await?;
    Ok(Json(DataResponse { data: users }))
}

/// PATCH /api/v1/admin/users/{id}
///
/// Update a user's profile, role, or active flag. A role change drops
/// the target's role-cache entry so UI hints refresh promptly (the
/// authorization path never consulted the cache to begin with).
pub async fn update_user(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(user_id): Path<DbId>,
    Json(input): Json<UpdateUser>,
) -> AppResult<impl IntoResponse> {
    require_role(&state.pool, auth.user_id, roles::can_close_orders).await?;

    if let Some(role) = &input.role {
        if !is_valid_role(role) {
            return Err(AppError::Core(CoreError::Validation(format!(
                "Unknown role '{role}'"
            ))));
        }
    }

    let user = UserRepo::update(
        &state.pool,
        user_id,
        input.display_name.as_deref(),
        input.role.as_deref(),
        input.is_active,
    )
    .await?
    .ok_or(AppError::Core(CoreError::NotFound {
        entity: "User",
        id: user_id,
    }))?;

    state.role_cache.invalidate(user_id).await;

    Ok(Json(DataResponse { data: user }))
}
