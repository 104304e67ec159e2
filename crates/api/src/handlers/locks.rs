//! Handlers for module locks and in-flight drafts.
//!
//! Locking here is availability-first: acquiring a scope someone else
//! holds is a forced takeover, not a denial. The displaced holder's
//! draft is snapshotted into version history before the lock moves, so
//! last-writer-wins never silently discards work. Release is the
//! opposite: the save must succeed first, or the lock stays held.

use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::Json;
use chrono::NaiveDate;
use darbast_core::error::CoreError;
use darbast_core::modules::{validate_module_scope, LockView, ModuleMessage};
use darbast_core::roles;
use darbast_core::types::DbId;
use darbast_db::models::module_lock::{ModuleScopeRequest, SaveDraftRequest};
use darbast_db::repositories::{ModuleDraftRepo, ModuleLockRepo, ModuleVersionRepo};
use darbast_events::PlatformEvent;
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

use super::require_role;

/// How many times acquisition retries when racing other sessions.
const ACQUIRE_RETRIES: u32 = 3;

/// Query parameters for lock status.
#[derive(Debug, Deserialize)]
pub struct ScopeQuery {
    pub module_key: String,
    pub module_date: Option<NaiveDate>,
}

/// POST /api/v1/modules/locks/acquire
///
/// Take the lock for a scope. Unlocked scopes lock immediately;
/// re-acquiring a scope you already hold is a no-op success; a scope
/// held by someone else is forcibly taken over after their draft is
/// auto-saved. The auto-save is best effort -- a failure is logged, not
/// propagated, since refusing takeover would strand the module.
pub async fn acquire(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<ModuleScopeRequest>,
) -> AppResult<impl IntoResponse> {
    require_role(&state.pool, auth.user_id, roles::can_edit_modules).await?;
    validate_module_scope(&input.module_key, input.module_date)
        .map_err(|e| AppError::Core(CoreError::Validation(e)))?;

    let mut attempt = 0;
    let lock = loop {
        match ModuleLockRepo::get(&state.pool, &input.module_key, input.module_date).await? {
            None => {
                // Unlocked; race the insert.
                if let Some(lock) = ModuleLockRepo::try_insert(
                    &state.pool,
                    &input.module_key,
                    input.module_date,
                    auth.user_id,
                )
                .await?
                {
                    break lock;
                }
                // Someone locked between the read and the insert.
            }
            Some(current) if current.holder_id == auth.user_id => {
                // Idempotent re-acquire (e.g. a reconnecting session).
                return Ok(Json(DataResponse { data: current }));
            }
            Some(current) => {
                auto_save_displaced_draft(&state, &input, current.holder_id).await;

                if let Some(lock) = ModuleLockRepo::take_over(
                    &state.pool,
                    &input.module_key,
                    input.module_date,
                    current.holder_id,
                    auth.user_id,
                )
                .await?
                {
                    break lock;
                }
                // The holder changed (or released) underneath us.
            }
        }

        attempt += 1;
        if attempt > ACQUIRE_RETRIES {
            return Err(AppError::Core(CoreError::Conflict(
                "The lock is changing hands rapidly, please retry".into(),
            )));
        }
    };

    tracing::info!(
        user_id = auth.user_id,
        module_key = %input.module_key,
        "Module lock acquired"
    );
    publish_lock_changed(&state, &input.module_key, input.module_date, Some(auth.user_id));

    Ok(Json(DataResponse { data: lock }))
}

/// POST /api/v1/modules/locks/release
///
/// Give the lock back. The scope's draft (if any) is saved as a version
/// first; if that save fails the release is aborted and the lock stays
/// held, so no work is lost without the client seeing the failure.
pub async fn release(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<ModuleScopeRequest>,
) -> AppResult<impl IntoResponse> {
    validate_module_scope(&input.module_key, input.module_date)
        .map_err(|e| AppError::Core(CoreError::Validation(e)))?;

    if let Some(draft) =
        ModuleDraftRepo::get(&state.pool, &input.module_key, input.module_date).await?
    {
        // Propagating the error aborts the release while the lock is
        // still held.
        let version = ModuleVersionRepo::save(
            &state.pool,
            &input.module_key,
            input.module_date,
            &draft.payload,
            auth.user_id,
        )
        .await?;
        ModuleDraftRepo::clear(&state.pool, &input.module_key, input.module_date).await?;
        publish_version_saved(&state, &input.module_key, input.module_date, version.version);
    }

    let released =
        ModuleLockRepo::release(&state.pool, &input.module_key, input.module_date, auth.user_id)
            .await?;
    if !released {
        return Err(AppError::Core(CoreError::Conflict(
            "You do not hold the lock on this module".into(),
        )));
    }

    tracing::info!(
        user_id = auth.user_id,
        module_key = %input.module_key,
        "Module lock released"
    );
    publish_lock_changed(&state, &input.module_key, input.module_date, None);

    Ok(Json(DataResponse {
        data: serde_json::json!({ "released": true }),
    }))
}

/// GET /api/v1/modules/locks/status
///
/// The lock state for a scope, with `is_mine` / `read_only` derived for
/// the caller.
pub async fn status(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<ScopeQuery>,
) -> AppResult<impl IntoResponse> {
    validate_module_scope(&params.module_key, params.module_date)
        .map_err(|e| AppError::Core(CoreError::Validation(e)))?;

    let lock = ModuleLockRepo::get(&state.pool, &params.module_key, params.module_date).await?;
    let view = LockView::for_user(
        lock.map(|l| (l.holder_id, l.acquired_at)),
        auth.user_id,
    );
    Ok(Json(DataResponse { data: view }))
}

/// PUT /api/v1/modules/draft
///
/// Write the in-flight draft for a scope. Holder only -- everyone else
/// sees the module read-only.
pub async fn save_draft(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<SaveDraftRequest>,
) -> AppResult<impl IntoResponse> {
    validate_module_scope(&input.module_key, input.module_date)
        .map_err(|e| AppError::Core(CoreError::Validation(e)))?;

    let lock = ModuleLockRepo::get(&state.pool, &input.module_key, input.module_date).await?;
    match lock {
        Some(lock) if lock.holder_id == auth.user_id => {}
        Some(_) => {
            return Err(AppError::Core(CoreError::Conflict(
                "The module is locked by another user".into(),
            )));
        }
        None => {
            return Err(AppError::Core(CoreError::Conflict(
                "Acquire the module lock before editing".into(),
            )));
        }
    }

    let draft = ModuleDraftRepo::upsert(
        &state.pool,
        &input.module_key,
        input.module_date,
        &input.payload,
        auth.user_id,
    )
    .await?;
    Ok(Json(DataResponse { data: draft }))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Snapshot the displaced holder's draft before a takeover. Best effort:
/// the takeover proceeds whether or not this lands.
async fn auto_save_displaced_draft(
    state: &AppState,
    scope: &ModuleScopeRequest,
    previous_holder_id: DbId,
) {
    let draft = match ModuleDraftRepo::get(&state.pool, &scope.module_key, scope.module_date).await
    {
        Ok(Some(draft)) => draft,
        Ok(None) => return,
        Err(e) => {
            tracing::warn!(error = %e, module_key = %scope.module_key, "Draft read failed before takeover");
            return;
        }
    };

    match ModuleVersionRepo::save(
        &state.pool,
        &scope.module_key,
        scope.module_date,
        &draft.payload,
        previous_holder_id,
    )
    .await
    {
        Ok(version) => {
            tracing::info!(
                module_key = %scope.module_key,
                previous_holder_id,
                version = version.version,
                "Auto-saved displaced holder's draft"
            );
            publish_version_saved(state, &scope.module_key, scope.module_date, version.version);
        }
        Err(e) => {
            tracing::warn!(
                error = %e,
                module_key = %scope.module_key,
                previous_holder_id,
                "Auto-save before takeover failed, taking over anyway"
            );
        }
    }
}

fn publish_lock_changed(
    state: &AppState,
    module_key: &str,
    module_date: Option<NaiveDate>,
    holder_id: Option<DbId>,
) {
    // The payload is the wire message the push transport forwards as-is.
    let message = ModuleMessage::LockChanged {
        module_key: module_key.to_string(),
        module_date,
        holder_id,
    };
    let mut event = PlatformEvent::new("module.lock.changed")
        .with_payload(serde_json::to_value(&message).unwrap_or_default());
    if let Some(holder_id) = holder_id {
        event = event.with_actor(holder_id);
    }
    state.event_bus.publish(event);
}

pub(crate) fn publish_version_saved(
    state: &AppState,
    module_key: &str,
    module_date: Option<NaiveDate>,
    version: i32,
) {
    let message = ModuleMessage::VersionSaved {
        module_key: module_key.to_string(),
        module_date,
        version,
    };
    state.event_bus.publish(
        PlatformEvent::new("module.version.saved")
            .with_payload(serde_json::to_value(&message).unwrap_or_default()),
    );
}
