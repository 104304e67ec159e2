//! Handlers for the `/orders` resource: draft CRUD and the
//! approval/payment pipeline.
//!
//! Every pipeline step re-reads the caller's role from the store, then
//! issues a status-guarded update; a guarded update that matches nothing
//! is reported as a Conflict naming the expected status, never applied
//! blindly.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use darbast_core::error::CoreError;
use darbast_core::order::{
    can_change_stage, generate_order_code, is_valid_stage, is_valid_status, stage_is_editable,
    statuses,
};
use darbast_core::roles;
use darbast_core::types::DbId;
use darbast_db::models::order::{
    CreateOrder, Order, RejectOrder, SetExecutionStage, UpdateOrder,
};
use darbast_db::repositories::{CollaboratorRepo, EventRepo, OrderRepo};
use darbast_events::{Notifier, PlatformEvent};
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

use super::require_role;

/// How many times order creation retries a code collision.
const CODE_RETRIES: u32 = 3;

/// Query parameters for `GET /orders`.
#[derive(Debug, Deserialize)]
pub struct OrderListQuery {
    pub include_archived: Option<bool>,
    /// Maximum number of results. Defaults to 50, capped at 100.
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

const MAX_LIMIT: i64 = 100;
const DEFAULT_LIMIT: i64 = 50;

/// Query parameters for the manager work queue.
#[derive(Debug, Deserialize)]
pub struct QueueQuery {
    pub status: String,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

// ---------------------------------------------------------------------------
// Draft CRUD
// ---------------------------------------------------------------------------

/// POST /api/v1/orders
///
/// Create a draft order owned by the caller.
pub async fn create_order(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateOrder>,
) -> AppResult<impl IntoResponse> {
    if input.address_line.trim().is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "address_line must not be empty".into(),
        )));
    }

    let mut attempt = 0;
    let order = loop {
        let code = generate_order_code();
        match OrderRepo::create(&state.pool, auth.user_id, &code, &input).await {
            Ok(order) => break order,
            Err(e) if is_code_collision(&e) && attempt < CODE_RETRIES => {
                attempt += 1;
                tracing::debug!(attempt, "Order code collision, regenerating");
            }
            Err(e) => return Err(e.into()),
        }
    };

    state.event_bus.publish(
        PlatformEvent::new("order.created")
            .with_source("order", order.id)
            .with_actor(auth.user_id),
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: order })))
}

/// GET /api/v1/orders
///
/// List the caller's own orders.
pub async fn list_orders(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<OrderListQuery>,
) -> AppResult<impl IntoResponse> {
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT);
    let offset = params.offset.unwrap_or(0);
    let orders = OrderRepo::list_owned(
        &state.pool,
        auth.user_id,
        params.include_archived.unwrap_or(false),
        limit,
        offset,
    )
    .await?;
    Ok(Json(DataResponse { data: orders }))
}

/// GET /api/v1/orders/{id}
///
/// Fetch one order. Visible to the owner, accepted collaborators, and
/// managers.
pub async fn get_order(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(order_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let order = load_order_for_viewer(&state, order_id, auth.user_id).await?;
    Ok(Json(DataResponse { data: order }))
}

/// PATCH /api/v1/orders/{id}
///
/// Edit a draft's address fields. Owner only, draft only.
pub async fn update_order(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(order_id): Path<DbId>,
    Json(input): Json<UpdateOrder>,
) -> AppResult<impl IntoResponse> {
    let order = OrderRepo::update_draft(&state.pool, order_id, auth.user_id, &input)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::Conflict(
                "Order is not an editable draft of yours".into(),
            ))
        })?;
    Ok(Json(DataResponse { data: order }))
}

// ---------------------------------------------------------------------------
// Pipeline steps
// ---------------------------------------------------------------------------

/// POST /api/v1/orders/{id}/submit -- owner sends the draft to review.
pub async fn submit_order(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(order_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let order = OrderRepo::submit(&state.pool, order_id, auth.user_id)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::Conflict(
                "Order is not a submittable draft of yours".into(),
            ))
        })?;

    state.event_bus.publish(
        PlatformEvent::new("order.submitted")
            .with_source("order", order.id)
            .with_actor(auth.user_id),
    );

    Ok(Json(DataResponse { data: order }))
}

/// POST /api/v1/orders/{id}/approve -- sales accepts a pending order.
pub async fn approve_order(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(order_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    require_role(&state.pool, auth.user_id, roles::can_review_orders).await?;

    let order = OrderRepo::approve(&state.pool, order_id, auth.user_id)
        .await?
        .ok_or_else(|| conflict_expecting(statuses::PENDING))?;

    notify_owner(
        &state,
        &order,
        "Order approved",
        &format!("Order {} was approved", order.code),
        "success",
    )
    .await;
    publish_status_event(&state, &order, auth.user_id);

    Ok(Json(DataResponse { data: order }))
}

/// POST /api/v1/orders/{id}/reject -- sales declines a pending order.
pub async fn reject_order(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(order_id): Path<DbId>,
    Json(input): Json<RejectOrder>,
) -> AppResult<impl IntoResponse> {
    require_role(&state.pool, auth.user_id, roles::can_review_orders).await?;

    let order = OrderRepo::transition(&state.pool, order_id, statuses::PENDING, statuses::REJECTED)
        .await?
        .ok_or_else(|| conflict_expecting(statuses::PENDING))?;

    let body = match input.reason.as_deref().filter(|r| !r.trim().is_empty()) {
        Some(reason) => format!("Order {} was declined: {reason}", order.code),
        None => format!("Order {} was declined", order.code),
    };
    notify_owner(&state, &order, "Order declined", &body, "warning").await;
    publish_status_event(&state, &order, auth.user_id);

    Ok(Json(DataResponse { data: order }))
}

/// POST /api/v1/orders/{id}/schedule -- executive takes the order on.
pub async fn schedule_execution(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(order_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    require_role(&state.pool, auth.user_id, roles::can_execute_orders).await?;

    let order = OrderRepo::schedule_execution(&state.pool, order_id, auth.user_id)
        .await?
        .ok_or_else(|| conflict_expecting(statuses::APPROVED))?;

    publish_status_event(&state, &order, auth.user_id);
    Ok(Json(DataResponse { data: order }))
}

/// POST /api/v1/orders/{id}/start -- work begins on site.
pub async fn start_work(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(order_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    require_role(&state.pool, auth.user_id, roles::can_execute_orders).await?;

    let order = OrderRepo::transition(
        &state.pool,
        order_id,
        statuses::PENDING_EXECUTION,
        statuses::IN_PROGRESS,
    )
    .await?
    .ok_or_else(|| conflict_expecting(statuses::PENDING_EXECUTION))?;

    publish_status_event(&state, &order, auth.user_id);
    Ok(Json(DataResponse { data: order }))
}

/// POST /api/v1/orders/{id}/complete -- physical work done.
pub async fn complete_order(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(order_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    require_role(&state.pool, auth.user_id, roles::can_execute_orders).await?;

    let order = OrderRepo::complete(&state.pool, order_id)
        .await?
        .ok_or_else(|| conflict_expecting(statuses::IN_PROGRESS))?;

    notify_owner(
        &state,
        &order,
        "Work completed",
        &format!("Work on order {} is finished", order.code),
        "success",
    )
    .await;
    publish_status_event(&state, &order, auth.user_id);

    Ok(Json(DataResponse { data: order }))
}

/// POST /api/v1/orders/{id}/pay -- finance settles the order.
pub async fn mark_paid(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(order_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    require_role(&state.pool, auth.user_id, roles::can_settle_orders).await?;

    let order = OrderRepo::transition(&state.pool, order_id, statuses::COMPLETED, statuses::PAID)
        .await?
        .ok_or_else(|| conflict_expecting(statuses::COMPLETED))?;

    publish_status_event(&state, &order, auth.user_id);
    Ok(Json(DataResponse { data: order }))
}

/// POST /api/v1/orders/{id}/close -- CEO closes out a paid order.
pub async fn close_order(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(order_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    require_role(&state.pool, auth.user_id, roles::can_close_orders).await?;

    let order = OrderRepo::transition(&state.pool, order_id, statuses::PAID, statuses::CLOSED)
        .await?
        .ok_or_else(|| conflict_expecting(statuses::PAID))?;

    publish_status_event(&state, &order, auth.user_id);
    Ok(Json(DataResponse { data: order }))
}

/// POST /api/v1/orders/{id}/stage -- executing manager moves the work axis.
pub async fn set_execution_stage(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(order_id): Path<DbId>,
    Json(input): Json<SetExecutionStage>,
) -> AppResult<impl IntoResponse> {
    require_role(&state.pool, auth.user_id, roles::can_execute_orders).await?;

    if !is_valid_stage(&input.stage) {
        return Err(AppError::Core(CoreError::Validation(format!(
            "Unknown execution stage '{}'",
            input.stage
        ))));
    }

    let order = OrderRepo::find_by_id(&state.pool, order_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Order",
            id: order_id,
        }))?;

    if !stage_is_editable(&order.status) {
        return Err(AppError::Core(CoreError::Conflict(format!(
            "Execution stage is frozen while the order is {}",
            order.status
        ))));
    }
    if !can_change_stage(&order.execution_stage, &input.stage) {
        return Err(AppError::Core(CoreError::Conflict(format!(
            "Cannot move stage from {} to {}",
            order.execution_stage, input.stage
        ))));
    }

    // Guarded on the stage we just read; a concurrent move surfaces here.
    let updated = OrderRepo::set_stage(&state.pool, order_id, &order.execution_stage, &input.stage)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::Conflict(
                "Execution stage changed underneath you, re-fetch and retry".into(),
            ))
        })?;

    state.event_bus.publish(
        PlatformEvent::new("order.stage.changed")
            .with_source("order", updated.id)
            .with_actor(auth.user_id)
            .with_payload(serde_json::json!({ "stage": updated.execution_stage })),
    );

    Ok(Json(DataResponse { data: updated }))
}

/// GET /api/v1/orders/queue
///
/// Manager work queue: orders sitting in one pipeline status, oldest
/// first.
pub async fn list_queue(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<QueueQuery>,
) -> AppResult<impl IntoResponse> {
    require_role(&state.pool, auth.user_id, roles::is_manager).await?;

    if !is_valid_status(&params.status) {
        return Err(AppError::Core(CoreError::Validation(format!(
            "Unknown order status '{}'",
            params.status
        ))));
    }

    let limit = params.limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT);
    let offset = params.offset.unwrap_or(0);
    let orders = OrderRepo::list_by_status(&state.pool, &params.status, limit, offset).await?;
    Ok(Json(DataResponse { data: orders }))
}

/// GET /api/v1/orders/{id}/events
///
/// Audit trail: the persisted platform events for one order, newest
/// first. Manager only.
pub async fn list_events(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(order_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    require_role(&state.pool, auth.user_id, roles::is_manager).await?;

    let events = EventRepo::list_for_entity(&state.pool, "order", order_id, MAX_LIMIT).await?;
    Ok(Json(DataResponse { data: events }))
}

// ---------------------------------------------------------------------------
// Archival
// ---------------------------------------------------------------------------

/// POST /api/v1/orders/{id}/archive
///
/// Archive a closed or rejected order. Owner or any manager.
pub async fn archive_order(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(order_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    ensure_owner_or_manager(&state, order_id, auth.user_id).await?;

    let order = OrderRepo::archive(&state.pool, order_id)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::Conflict(
                "Only closed or rejected orders can be archived".into(),
            ))
        })?;
    Ok(Json(DataResponse { data: order }))
}

/// POST /api/v1/orders/{id}/deep-archive
///
/// Hide an archived order from every listing. Manager only.
pub async fn deep_archive_order(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(order_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    require_role(&state.pool, auth.user_id, roles::is_manager).await?;

    let order = OrderRepo::deep_archive(&state.pool, order_id)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::Conflict(
                "Order must be archived before deep archival".into(),
            ))
        })?;
    Ok(Json(DataResponse { data: order }))
}

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

fn conflict_expecting(expected: &str) -> AppError {
    AppError::Core(CoreError::Conflict(format!(
        "Order is not in the {expected} status"
    )))
}

fn is_code_collision(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => {
            db_err.code().as_deref() == Some("23505")
                && db_err.constraint() == Some("uq_orders_code")
        }
        _ => false,
    }
}

fn publish_status_event(state: &AppState, order: &Order, actor: DbId) {
    state.event_bus.publish(
        PlatformEvent::new("order.status.changed")
            .with_source("order", order.id)
            .with_actor(actor)
            .with_payload(serde_json::json!({ "status": order.status })),
    );
}

async fn notify_owner(state: &AppState, order: &Order, title: &str, body: &str, severity: &str) {
    Notifier::send(
        &state.pool,
        &state.event_bus,
        order.owner_id,
        title,
        body,
        Some(&format!("/orders/{}", order.id)),
        severity,
    )
    .await;
}

/// Fetch an order the caller may at least view: owner, accepted
/// collaborator, or any manager. Reported as NotFound otherwise so the
/// response does not reveal the order's existence.
pub(crate) async fn load_order_for_viewer(
    state: &AppState,
    order_id: DbId,
    user_id: DbId,
) -> AppResult<Order> {
    let not_found = || {
        AppError::Core(CoreError::NotFound {
            entity: "Order",
            id: order_id,
        })
    };

    let order = OrderRepo::find_by_id(&state.pool, order_id)
        .await?
        .ok_or_else(not_found)?;

    if order.owner_id == user_id {
        return Ok(order);
    }
    if CollaboratorRepo::is_accepted_collaborator(&state.pool, order_id, user_id).await? {
        return Ok(order);
    }
    let role = darbast_db::repositories::UserRepo::get_role(&state.pool, user_id).await?;
    if role.as_deref().is_some_and(roles::is_manager) {
        return Ok(order);
    }

    Err(not_found())
}

/// Require the caller to be the order's owner or a manager.
async fn ensure_owner_or_manager(
    state: &AppState,
    order_id: DbId,
    user_id: DbId,
) -> AppResult<Order> {
    let order = OrderRepo::find_by_id(&state.pool, order_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Order",
            id: order_id,
        }))?;

    if order.owner_id == user_id {
        return Ok(order);
    }
    require_role(&state.pool, user_id, roles::is_manager).await?;
    Ok(order)
}
