//! Handlers for collaborator invitations on orders.
//!
//! The roster is capped at five non-rejected collaborators; the cap
//! check is serialized in the repository, and the duplicate-phone rule
//! is backstopped by a partial unique index the error classifier
//! translates for clients.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use darbast_core::collaborator::MAX_ACTIVE_COLLABORATORS;
use darbast_core::error::CoreError;
use darbast_core::phone::normalize_and_validate;
use darbast_core::types::DbId;
use darbast_db::models::collaborator::{InviteCollaborator, RespondToInvite};
use darbast_db::repositories::collaborator_repo::InviteOutcome;
use darbast_db::repositories::{CollaboratorRepo, OrderRepo, UserRepo};
use darbast_events::Notifier;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

use super::FORBIDDEN_MSG;

/// POST /api/v1/orders/{id}/collaborators
///
/// Invite a phone number onto the order's roster. Allowed for the owner
/// and accepted collaborators. The invite stands even when the number
/// has no account yet; it is matched at registration time.
pub async fn invite(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(order_id): Path<DbId>,
    Json(input): Json<InviteCollaborator>,
) -> AppResult<impl IntoResponse> {
    let phone = normalize_and_validate(&input.phone_number)
        .map_err(|e| AppError::Core(CoreError::Validation(e)))?;

    let order = OrderRepo::find_by_id(&state.pool, order_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Order",
            id: order_id,
        }))?;

    let may_invite = order.owner_id == auth.user_id
        || CollaboratorRepo::is_accepted_collaborator(&state.pool, order_id, auth.user_id).await?;
    if !may_invite {
        return Err(AppError::Core(CoreError::Forbidden(FORBIDDEN_MSG.into())));
    }

    let invitee = UserRepo::find_by_phone(&state.pool, &phone).await?;
    if invitee.as_ref().is_some_and(|u| u.id == auth.user_id) {
        return Err(AppError::Core(CoreError::Validation(
            "Cannot invite yourself as a collaborator".into(),
        )));
    }

    let outcome = CollaboratorRepo::invite(
        &state.pool,
        order_id,
        auth.user_id,
        invitee.as_ref().map(|u| u.id),
        &phone,
    )
    .await?;

    let row = match outcome {
        InviteOutcome::Created(row) => row,
        InviteOutcome::RosterFull => {
            return Err(AppError::Core(CoreError::Conflict(format!(
                "Order already has {MAX_ACTIVE_COLLABORATORS} active collaborators"
            ))));
        }
        InviteOutcome::OrderMissing => {
            return Err(AppError::Core(CoreError::NotFound {
                entity: "Order",
                id: order_id,
            }));
        }
    };

    if let Some(invitee) = invitee {
        Notifier::send(
            &state.pool,
            &state.event_bus,
            invitee.id,
            "Collaboration invite",
            &format!("You were invited to collaborate on order {}", order.code),
            Some(&format!("/orders/{order_id}")),
            "info",
        )
        .await;
    }

    Ok((StatusCode::CREATED, Json(DataResponse { data: row })))
}

/// GET /api/v1/orders/{id}/collaborators
///
/// The order's roster, newest invite first, with display names where
/// resolvable.
pub async fn list(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(order_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    super::orders::load_order_for_viewer(&state, order_id, auth.user_id).await?;

    let rows = CollaboratorRepo::list_for_order(&state.pool, order_id).await?;
    Ok(Json(DataResponse { data: rows }))
}

/// POST /api/v1/collaborators/{id}/respond
///
/// The invitee accepts or rejects. Answering twice is a Conflict.
pub async fn respond(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(collaborator_id): Path<DbId>,
    Json(input): Json<RespondToInvite>,
) -> AppResult<impl IntoResponse> {
    let row = CollaboratorRepo::find_by_id(&state.pool, collaborator_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Collaborator",
            id: collaborator_id,
        }))?;
    if row.invitee_user_id != Some(auth.user_id) {
        return Err(AppError::Core(CoreError::Forbidden(FORBIDDEN_MSG.into())));
    }

    let updated = CollaboratorRepo::respond(&state.pool, collaborator_id, auth.user_id, input.accept)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::Conflict(
                "Invitation has already been answered".into(),
            ))
        })?;

    let (title, body, severity) = if input.accept {
        ("Invite accepted", "Your collaboration invite was accepted", "success")
    } else {
        ("Invite declined", "Your collaboration invite was declined", "warning")
    };
    Notifier::send(
        &state.pool,
        &state.event_bus,
        updated.inviter_user_id,
        title,
        body,
        Some(&format!("/orders/{}", updated.order_id)),
        severity,
    )
    .await;

    Ok(Json(DataResponse { data: updated }))
}

/// DELETE /api/v1/collaborators/{id}
///
/// The original inviter withdraws a pending invite. Accepted
/// collaborators cannot be removed through this path.
pub async fn remove(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(collaborator_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let row = CollaboratorRepo::find_by_id(&state.pool, collaborator_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Collaborator",
            id: collaborator_id,
        }))?;
    if row.inviter_user_id != auth.user_id {
        return Err(AppError::Core(CoreError::Forbidden(FORBIDDEN_MSG.into())));
    }

    let removed =
        CollaboratorRepo::remove_pending(&state.pool, collaborator_id, auth.user_id).await?;
    if !removed {
        return Err(AppError::Core(CoreError::Conflict(
            "Only pending invitations can be withdrawn".into(),
        )));
    }

    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/v1/collaborators/{id}/revoke
///
/// The order owner revokes an accepted collaborator. A deliberate,
/// separate elevated action -- inviters cannot do this.
pub async fn revoke(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(collaborator_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let row = CollaboratorRepo::find_by_id(&state.pool, collaborator_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Collaborator",
            id: collaborator_id,
        }))?;

    let order = OrderRepo::find_by_id(&state.pool, row.order_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Order",
            id: row.order_id,
        }))?;
    if order.owner_id != auth.user_id {
        return Err(AppError::Core(CoreError::Forbidden(FORBIDDEN_MSG.into())));
    }

    let revoked = CollaboratorRepo::revoke_accepted(&state.pool, collaborator_id).await?;
    if !revoked {
        return Err(AppError::Core(CoreError::Conflict(
            "Only accepted collaborators can be revoked".into(),
        )));
    }

    if let Some(invitee_id) = row.invitee_user_id {
        Notifier::send(
            &state.pool,
            &state.event_bus,
            invitee_id,
            "Access revoked",
            &format!("Your access to order {} was revoked", order.code),
            None,
            "warning",
        )
        .await;
    }

    Ok(StatusCode::NO_CONTENT)
}
