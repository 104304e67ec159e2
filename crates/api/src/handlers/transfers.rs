//! Handlers for the ownership transfer workflow.
//!
//! A transfer runs through two gates: a sales manager approves the
//! re-assignment, then the recipient accepts it. Every transition is a
//! guarded update; acting on a terminal request is a Conflict, never a
//! silent no-op.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use darbast_core::error::CoreError;
use darbast_core::phone::normalize_and_validate;
use darbast_core::roles;
use darbast_core::types::DbId;
use darbast_db::models::transfer::{CreateTransferRequest, RejectTransferRequest};
use darbast_db::repositories::{OrderRepo, TransferRepo, UserRepo};
use darbast_events::{Notifier, PlatformEvent};
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

use super::{require_role, FORBIDDEN_MSG};

/// Query parameters for the manager review queue.
#[derive(Debug, Deserialize)]
pub struct PendingQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

const MAX_LIMIT: i64 = 100;
const DEFAULT_LIMIT: i64 = 50;

/// POST /api/v1/orders/{id}/transfers
///
/// The current owner files a transfer request. Enters at the manager
/// gate when the recipient has an account, or parks in registration
/// when the phone number is unknown.
pub async fn create_transfer(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(order_id): Path<DbId>,
    Json(input): Json<CreateTransferRequest>,
) -> AppResult<impl IntoResponse> {
    let phone = normalize_and_validate(&input.to_phone_number)
        .map_err(|e| AppError::Core(CoreError::Validation(e)))?;

    let order = OrderRepo::find_by_id(&state.pool, order_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Order",
            id: order_id,
        }))?;
    if order.owner_id != auth.user_id {
        return Err(AppError::Core(CoreError::Forbidden(FORBIDDEN_MSG.into())));
    }

    let recipient = UserRepo::find_by_phone(&state.pool, &phone).await?;
    if recipient.as_ref().is_some_and(|r| r.id == auth.user_id) {
        return Err(AppError::Core(CoreError::Validation(
            "Cannot transfer an order to yourself".into(),
        )));
    }

    // The partial unique index rejects a second open request; the error
    // classifier turns that into a Conflict.
    let request = TransferRepo::create(
        &state.pool,
        order_id,
        auth.user_id,
        recipient.as_ref().map(|r| r.id),
        &phone,
    )
    .await?;

    state.event_bus.publish(
        PlatformEvent::new("order.transfer.requested")
            .with_source("order", order_id)
            .with_actor(auth.user_id)
            .with_payload(serde_json::json!({ "request_id": request.id })),
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: request })))
}

/// GET /api/v1/orders/{id}/transfers
///
/// Transfer history for an order, oldest first.
pub async fn list_for_order(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(order_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    // Re-uses the order visibility rule (owner/collaborator/manager).
    super::orders::load_order_for_viewer(&state, order_id, auth.user_id).await?;

    let requests = TransferRepo::list_for_order(&state.pool, order_id).await?;
    Ok(Json(DataResponse { data: requests }))
}

/// GET /api/v1/transfers/pending
///
/// The manager review queue, oldest first.
pub async fn list_pending(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<PendingQuery>,
) -> AppResult<impl IntoResponse> {
    require_role(&state.pool, auth.user_id, roles::can_review_orders).await?;

    let limit = params.limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT);
    let offset = params.offset.unwrap_or(0);
    let requests = TransferRepo::list_pending_manager(&state.pool, limit, offset).await?;
    Ok(Json(DataResponse { data: requests }))
}

/// GET /api/v1/transfers/incoming
///
/// Requests awaiting the caller's answer.
pub async fn list_incoming(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let requests = TransferRepo::list_for_recipient(&state.pool, auth.user_id).await?;
    Ok(Json(DataResponse { data: requests }))
}

/// POST /api/v1/transfers/{id}/approve
///
/// Manager gate: pending_manager -> pending_recipient.
pub async fn approve(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(request_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    require_role(&state.pool, auth.user_id, roles::can_review_orders).await?;

    let request = TransferRepo::manager_approve(&state.pool, request_id, auth.user_id)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::Conflict(
                "Transfer request is not awaiting manager review".into(),
            ))
        })?;

    if let Some(recipient_id) = request.to_user_id {
        Notifier::send(
            &state.pool,
            &state.event_bus,
            recipient_id,
            "Order transfer offer",
            "An order transfer is awaiting your answer",
            Some("/transfers/incoming"),
            "info",
        )
        .await;
    }

    state.event_bus.publish(
        PlatformEvent::new("order.transfer.manager_approved")
            .with_source("order", request.order_id)
            .with_actor(auth.user_id)
            .with_payload(serde_json::json!({ "request_id": request.id })),
    );

    Ok(Json(DataResponse { data: request }))
}

/// POST /api/v1/transfers/{id}/reject
///
/// Manager gate: pending_manager -> manager_rejected (terminal).
pub async fn reject(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(request_id): Path<DbId>,
    Json(input): Json<RejectTransferRequest>,
) -> AppResult<impl IntoResponse> {
    require_role(&state.pool, auth.user_id, roles::can_review_orders).await?;

    let request =
        TransferRepo::manager_reject(&state.pool, request_id, auth.user_id, input.reason.as_deref())
            .await?
            .ok_or_else(|| {
                AppError::Core(CoreError::Conflict(
                    "Transfer request is not awaiting manager review".into(),
                ))
            })?;

    let body = match request.manager_reject_reason.as_deref() {
        Some(reason) => format!("Your transfer request was declined: {reason}"),
        None => "Your transfer request was declined".to_string(),
    };
    Notifier::send(
        &state.pool,
        &state.event_bus,
        request.from_user_id,
        "Transfer declined",
        &body,
        Some(&format!("/orders/{}", request.order_id)),
        "warning",
    )
    .await;

    Ok(Json(DataResponse { data: request }))
}

/// POST /api/v1/transfers/{id}/accept
///
/// Recipient gate: pending_recipient -> accepted. Moves ownership and
/// stamps provenance in the same transaction.
pub async fn accept(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(request_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let request = TransferRepo::accept(&state.pool, request_id, auth.user_id)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::Conflict(
                "Transfer request is not awaiting your answer".into(),
            ))
        })?;

    Notifier::send(
        &state.pool,
        &state.event_bus,
        request.from_user_id,
        "Transfer accepted",
        "Your order transfer was accepted; ownership has moved",
        Some(&format!("/orders/{}", request.order_id)),
        "success",
    )
    .await;

    state.event_bus.publish(
        PlatformEvent::new("order.transfer.accepted")
            .with_source("order", request.order_id)
            .with_actor(auth.user_id)
            .with_payload(serde_json::json!({ "request_id": request.id })),
    );

    Ok(Json(DataResponse { data: request }))
}

/// POST /api/v1/transfers/{id}/decline
///
/// Recipient gate: pending_recipient -> recipient_rejected (terminal).
pub async fn decline(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(request_id): Path<DbId>,
    Json(input): Json<RejectTransferRequest>,
) -> AppResult<impl IntoResponse> {
    let request = TransferRepo::recipient_reject(
        &state.pool,
        request_id,
        auth.user_id,
        input.reason.as_deref(),
    )
    .await?
    .ok_or_else(|| {
        AppError::Core(CoreError::Conflict(
            "Transfer request is not awaiting your answer".into(),
        ))
    })?;

    Notifier::send(
        &state.pool,
        &state.event_bus,
        request.from_user_id,
        "Transfer declined",
        "The recipient declined your order transfer",
        Some(&format!("/orders/{}", request.order_id)),
        "warning",
    )
    .await;

    Ok(Json(DataResponse { data: request }))
}
