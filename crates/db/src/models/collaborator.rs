//! Collaborator entity model and DTOs.

use darbast_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `order_collaborators` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Collaborator {
    pub id: DbId,
    pub order_id: DbId,
    pub inviter_user_id: DbId,
    /// `None` until a user account matching the phone number exists.
    pub invitee_user_id: Option<DbId>,
    pub invitee_phone_number: String,
    pub status: String,
    pub invited_at: Timestamp,
    pub responded_at: Option<Timestamp>,
}

/// A collaborator row joined with the invitee's display name, when
/// resolvable.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct CollaboratorWithName {
    pub id: DbId,
    pub order_id: DbId,
    pub inviter_user_id: DbId,
    pub invitee_user_id: Option<DbId>,
    pub invitee_phone_number: String,
    pub status: String,
    pub invited_at: Timestamp,
    pub responded_at: Option<Timestamp>,
    pub invitee_display_name: Option<String>,
}

/// DTO for inviting a collaborator.
#[derive(Debug, Deserialize)]
pub struct InviteCollaborator {
    pub phone_number: String,
}

/// DTO for the invitee's answer.
#[derive(Debug, Deserialize)]
pub struct RespondToInvite {
    pub accept: bool,
}
