//! Repository for the `order_collaborators` table.
//!
//! The invite path runs inside a transaction holding `FOR UPDATE` on the
//! order row so two concurrent invites cannot both pass the 5-slot
//! roster check. Duplicate phones on the same order are backstopped by
//! the partial unique index `uq_order_collaborators_phone`.

use darbast_core::collaborator::{statuses, MAX_ACTIVE_COLLABORATORS};
use darbast_core::types::DbId;
use sqlx::{PgPool, Postgres, Transaction};

use crate::models::collaborator::{Collaborator, CollaboratorWithName};
use crate::repositories::OrderRepo;

/// Column list for `order_collaborators` queries.
const COLUMNS: &str = "id, order_id, inviter_user_id, invitee_user_id, \
                       invitee_phone_number, status, invited_at, responded_at";

/// Outcome of an invite attempt that passed validation but still has to
/// clear the roster cap inside the transaction.
#[derive(Debug)]
pub enum InviteOutcome {
    Created(Collaborator),
    /// The order already has the maximum number of active collaborators.
    RosterFull,
    /// The order does not exist.
    OrderMissing,
}

/// Provides workflow operations for collaborator invitations.
pub struct CollaboratorRepo;

impl CollaboratorRepo {
    /// Insert a pending invite, serialized against the roster cap.
    ///
    /// A duplicate non-rejected phone on the order surfaces as a
    /// unique-violation error for the caller to map.
    pub async fn invite(
        pool: &PgPool,
        order_id: DbId,
        inviter_user_id: DbId,
        invitee_user_id: Option<DbId>,
        invitee_phone_number: &str,
    ) -> Result<InviteOutcome, sqlx::Error> {
        let mut tx = pool.begin().await?;

        if !OrderRepo::lock_row(&mut tx, order_id).await? {
            tx.rollback().await?;
            return Ok(InviteOutcome::OrderMissing);
        }

        let active = Self::count_active_tx(&mut tx, order_id).await?;
        if active >= MAX_ACTIVE_COLLABORATORS {
            tx.rollback().await?;
            return Ok(InviteOutcome::RosterFull);
        }

        let query = format!(
            "INSERT INTO order_collaborators \
                 (order_id, inviter_user_id, invitee_user_id, invitee_phone_number) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {COLUMNS}"
        );
        let row = sqlx::query_as::<_, Collaborator>(&query)
            .bind(order_id)
            .bind(inviter_user_id)
            .bind(invitee_user_id)
            .bind(invitee_phone_number)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(InviteOutcome::Created(row))
    }

    /// Find a collaborator row by id.
    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<Collaborator>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM order_collaborators WHERE id = $1");
        sqlx::query_as::<_, Collaborator>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// All rows for an order, newest invite first, with display names
    /// joined where the invitee is resolvable.
    pub async fn list_for_order(
        pool: &PgPool,
        order_id: DbId,
    ) -> Result<Vec<CollaboratorWithName>, sqlx::Error> {
        let query = "SELECT c.id, c.order_id, c.inviter_user_id, c.invitee_user_id, \
                            c.invitee_phone_number, c.status, c.invited_at, c.responded_at, \
                            u.display_name AS invitee_display_name \
                     FROM order_collaborators c \
                     LEFT JOIN users u ON u.id = c.invitee_user_id \
                     WHERE c.order_id = $1 \
                     ORDER BY c.invited_at DESC";
        sqlx::query_as::<_, CollaboratorWithName>(query)
            .bind(order_id)
            .fetch_all(pool)
            .await
    }

    /// All rows for an order in invitation order (ownership chain input).
    pub async fn list_for_order_oldest_first(
        pool: &PgPool,
        order_id: DbId,
    ) -> Result<Vec<Collaborator>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM order_collaborators \
             WHERE order_id = $1 \
             ORDER BY invited_at ASC"
        );
        sqlx::query_as::<_, Collaborator>(&query)
            .bind(order_id)
            .fetch_all(pool)
            .await
    }

    /// The invitee's answer: pending -> accepted/rejected. Only the
    /// invitee's own pending row matches.
    pub async fn respond(
        pool: &PgPool,
        id: DbId,
        invitee_user_id: DbId,
        accept: bool,
    ) -> Result<Option<Collaborator>, sqlx::Error> {
        let new_status = if accept {
            statuses::ACCEPTED
        } else {
            statuses::REJECTED
        };
        let query = format!(
            "UPDATE order_collaborators SET \
                 status = $3, responded_at = NOW() \
             WHERE id = $1 AND invitee_user_id = $2 AND status = '{}' \
             RETURNING {COLUMNS}",
            statuses::PENDING,
        );
        sqlx::query_as::<_, Collaborator>(&query)
            .bind(id)
            .bind(invitee_user_id)
            .bind(new_status)
            .fetch_optional(pool)
            .await
    }

    /// Delete a pending invite. Only the original inviter may remove,
    /// and only before the invitee answers.
    pub async fn remove_pending(
        pool: &PgPool,
        id: DbId,
        inviter_user_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(&format!(
            "DELETE FROM order_collaborators \
             WHERE id = $1 AND inviter_user_id = $2 AND status = '{}'",
            statuses::PENDING,
        ))
        .bind(id)
        .bind(inviter_user_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete an accepted collaborator. The owner-only gate lives in the
    /// handler; this only guards the status.
    pub async fn revoke_accepted(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(&format!(
            "DELETE FROM order_collaborators WHERE id = $1 AND status = '{}'",
            statuses::ACCEPTED,
        ))
        .bind(id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Non-rejected rows currently occupying roster slots.
    pub async fn count_active(pool: &PgPool, order_id: DbId) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM order_collaborators \
             WHERE order_id = $1 AND status <> '{}'",
            statuses::REJECTED,
        ))
        .bind(order_id)
        .fetch_one(pool)
        .await
    }

    /// True when the user holds an accepted collaborator row on the order.
    pub async fn is_accepted_collaborator(
        pool: &PgPool,
        order_id: DbId,
        user_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let count: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM order_collaborators \
             WHERE order_id = $1 AND invitee_user_id = $2 AND status = '{}'",
            statuses::ACCEPTED,
        ))
        .bind(order_id)
        .bind(user_id)
        .fetch_one(pool)
        .await?;
        Ok(count > 0)
    }

    /// Attach a freshly registered user to pending invites matching their
    /// phone number. Returns how many rows were matched.
    pub async fn attach_registered_user(
        pool: &PgPool,
        phone_number: &str,
        user_id: DbId,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE order_collaborators SET invitee_user_id = $2 \
             WHERE invitee_phone_number = $1 AND invitee_user_id IS NULL",
        )
        .bind(phone_number)
        .bind(user_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn count_active_tx(
        tx: &mut Transaction<'_, Postgres>,
        order_id: DbId,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM order_collaborators \
             WHERE order_id = $1 AND status <> '{}'",
            statuses::REJECTED,
        ))
        .bind(order_id)
        .fetch_one(&mut **tx)
        .await
    }
}
