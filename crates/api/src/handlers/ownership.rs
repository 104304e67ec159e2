//! Handler for the ownership chain projection.
//!
//! Gathers everything that ever touched an order's ownership and merges
//! it into one timestamp-ordered sequence. The merge itself is a pure
//! function in `darbast_core`; this handler only fetches rows and
//! resolves display names.

use std::collections::HashMap;

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use darbast_core::chain::{merge_chain, ChainItemKind, OwnershipChainItem};
use darbast_core::types::DbId;
use darbast_db::repositories::{CollaboratorRepo, TransferRepo, UserRepo};

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/orders/{id}/ownership-chain
///
/// The order's full provenance: original owner, every transfer request,
/// every collaborator invite, and the assigned executing manager, in
/// temporal order.
pub async fn get_chain(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(order_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let order = super::orders::load_order_for_viewer(&state, order_id, auth.user_id).await?;

    let transfers = TransferRepo::list_for_order(&state.pool, order_id).await?;
    let collaborators = CollaboratorRepo::list_for_order_oldest_first(&state.pool, order_id).await?;

    // One round trip for every display name the chain can mention.
    let original_owner_id = order.transferred_from_user_id.unwrap_or(order.owner_id);
    let mut ids: Vec<DbId> = vec![original_owner_id];
    ids.extend(transfers.iter().filter_map(|t| t.to_user_id));
    ids.extend(collaborators.iter().filter_map(|c| c.invitee_user_id));
    ids.extend(order.executed_by);
    ids.sort_unstable();
    ids.dedup();
    let names: HashMap<DbId, String> = UserRepo::display_names(&state.pool, &ids)
        .await?
        .into_iter()
        .collect();
    let name_of = |id: Option<DbId>| id.and_then(|id| names.get(&id).cloned());

    let original_owner = OwnershipChainItem {
        kind: ChainItemKind::OriginalOwner,
        user_id: Some(original_owner_id),
        display_name: name_of(Some(original_owner_id)),
        status: None,
        occurred_at: order.created_at,
    };

    let transfer_items = transfers
        .iter()
        .map(|t| OwnershipChainItem {
            kind: ChainItemKind::Transfer,
            user_id: t.to_user_id,
            display_name: name_of(t.to_user_id),
            status: Some(t.status.clone()),
            occurred_at: t.created_at,
        })
        .collect();

    let collaborator_items = collaborators
        .iter()
        .map(|c| OwnershipChainItem {
            kind: ChainItemKind::Collaborator,
            user_id: c.invitee_user_id,
            display_name: name_of(c.invitee_user_id),
            status: Some(c.status.clone()),
            occurred_at: c.invited_at,
        })
        .collect();

    let manager_item = order.executed_by.map(|manager_id| OwnershipChainItem {
        kind: ChainItemKind::AssignedManager,
        user_id: Some(manager_id),
        display_name: name_of(Some(manager_id)),
        status: None,
        occurred_at: order.updated_at,
    });

    let chain = merge_chain(original_owner, transfer_items, collaborator_items, manager_item);
    Ok(Json(DataResponse { data: chain }))
}
