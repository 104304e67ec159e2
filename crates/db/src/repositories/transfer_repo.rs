//! Repository for the `transfer_requests` table.
//!
//! Transitions are conditional updates guarded on the expected prior
//! status; acceptance additionally moves order ownership in the same
//! transaction so two racing accepts (or an accept racing a second
//! transfer) cannot both apply. The partial unique index
//! `uq_transfer_requests_open` backstops the one-open-request-per-order
//! invariant at the store.

use darbast_core::transfer::statuses;
use darbast_core::types::DbId;
use sqlx::PgPool;

use crate::models::transfer::TransferRequest;
use crate::repositories::OrderRepo;

/// Column list for `transfer_requests` queries.
const COLUMNS: &str = "id, order_id, from_user_id, to_user_id, to_phone_number, status, \
                       approved_by, manager_responded_at, manager_reject_reason, \
                       recipient_responded_at, recipient_reject_reason, \
                       created_at, updated_at";

/// Provides workflow operations for ownership transfer requests.
pub struct TransferRepo;

impl TransferRepo {
    /// File a new transfer request.
    ///
    /// `to_user_id` decides the entry point: a known recipient starts at
    /// the manager gate, an unknown phone parks in `pending_registration`.
    /// An existing open request for the order trips the partial unique
    /// index and surfaces as a unique-violation for the caller to map.
    pub async fn create(
        pool: &PgPool,
        order_id: DbId,
        from_user_id: DbId,
        to_user_id: Option<DbId>,
        to_phone_number: &str,
    ) -> Result<TransferRequest, sqlx::Error> {
        let initial_status = if to_user_id.is_some() {
            statuses::PENDING_MANAGER
        } else {
            statuses::PENDING_REGISTRATION
        };
        let query = format!(
            "INSERT INTO transfer_requests (order_id, from_user_id, to_user_id, to_phone_number, status) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, TransferRequest>(&query)
            .bind(order_id)
            .bind(from_user_id)
            .bind(to_user_id)
            .bind(to_phone_number)
            .bind(initial_status)
            .fetch_one(pool)
            .await
    }

    /// Find a request by id.
    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<TransferRequest>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM transfer_requests WHERE id = $1");
        sqlx::query_as::<_, TransferRequest>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// All requests ever filed for an order, in creation order.
    pub async fn list_for_order(
        pool: &PgPool,
        order_id: DbId,
    ) -> Result<Vec<TransferRequest>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM transfer_requests \
             WHERE order_id = $1 \
             ORDER BY created_at ASC"
        );
        sqlx::query_as::<_, TransferRequest>(&query)
            .bind(order_id)
            .fetch_all(pool)
            .await
    }

    /// The order's open (non-terminal) request, if any.
    pub async fn find_open_for_order(
        pool: &PgPool,
        order_id: DbId,
    ) -> Result<Option<TransferRequest>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM transfer_requests \
             WHERE order_id = $1 \
               AND status IN ('{}', '{}', '{}')",
            statuses::PENDING_MANAGER,
            statuses::PENDING_RECIPIENT,
            statuses::PENDING_REGISTRATION,
        );
        sqlx::query_as::<_, TransferRequest>(&query)
            .bind(order_id)
            .fetch_optional(pool)
            .await
    }

    /// Requests waiting for manager review, oldest first.
    pub async fn list_pending_manager(
        pool: &PgPool,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<TransferRequest>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM transfer_requests \
             WHERE status = '{}' \
             ORDER BY created_at ASC \
             LIMIT $1 OFFSET $2",
            statuses::PENDING_MANAGER,
        );
        sqlx::query_as::<_, TransferRequest>(&query)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Requests aimed at a user, in either recipient-facing status.
    pub async fn list_for_recipient(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Vec<TransferRequest>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM transfer_requests \
             WHERE to_user_id = $1 AND status = '{}' \
             ORDER BY created_at ASC",
            statuses::PENDING_RECIPIENT,
        );
        sqlx::query_as::<_, TransferRequest>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    /// Manager approval: pending_manager -> pending_recipient.
    pub async fn manager_approve(
        pool: &PgPool,
        id: DbId,
        manager_id: DbId,
    ) -> Result<Option<TransferRequest>, sqlx::Error> {
        let query = format!(
            "UPDATE transfer_requests SET \
                 status = '{}', approved_by = $2, \
                 manager_responded_at = NOW(), updated_at = NOW() \
             WHERE id = $1 AND status = '{}' \
             RETURNING {COLUMNS}",
            statuses::PENDING_RECIPIENT,
            statuses::PENDING_MANAGER,
        );
        sqlx::query_as::<_, TransferRequest>(&query)
            .bind(id)
            .bind(manager_id)
            .fetch_optional(pool)
            .await
    }

    /// Manager rejection: pending_manager -> manager_rejected (terminal).
    pub async fn manager_reject(
        pool: &PgPool,
        id: DbId,
        manager_id: DbId,
        reason: Option<&str>,
    ) -> Result<Option<TransferRequest>, sqlx::Error> {
        let query = format!(
            "UPDATE transfer_requests SET \
                 status = '{}', approved_by = $2, manager_reject_reason = $3, \
                 manager_responded_at = NOW(), updated_at = NOW() \
             WHERE id = $1 AND status = '{}' \
             RETURNING {COLUMNS}",
            statuses::MANAGER_REJECTED,
            statuses::PENDING_MANAGER,
        );
        sqlx::query_as::<_, TransferRequest>(&query)
            .bind(id)
            .bind(manager_id)
            .bind(reason)
            .fetch_optional(pool)
            .await
    }

    /// Recipient acceptance: pending_recipient -> accepted, moving order
    /// ownership in the same transaction.
    ///
    /// Returns `None` when the request is not in `pending_recipient` for
    /// this recipient, or when the order's owner changed underneath the
    /// request (both are Conflicts to the caller). Nothing is committed
    /// in either case.
    pub async fn accept(
        pool: &PgPool,
        id: DbId,
        recipient_id: DbId,
    ) -> Result<Option<TransferRequest>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "UPDATE transfer_requests SET \
                 status = '{}', recipient_responded_at = NOW(), updated_at = NOW() \
             WHERE id = $1 AND to_user_id = $2 AND status = '{}' \
             RETURNING {COLUMNS}",
            statuses::ACCEPTED,
            statuses::PENDING_RECIPIENT,
        );
        let request = sqlx::query_as::<_, TransferRequest>(&query)
            .bind(id)
            .bind(recipient_id)
            .fetch_optional(&mut *tx)
            .await?;

        let Some(request) = request else {
            tx.rollback().await?;
            return Ok(None);
        };

        let moved = OrderRepo::change_owner(
            &mut tx,
            request.order_id,
            request.from_user_id,
            recipient_id,
        )
        .await?;
        if !moved {
            // Ownership changed underneath the request; nothing applies.
            tx.rollback().await?;
            return Ok(None);
        }

        tx.commit().await?;
        Ok(Some(request))
    }

    /// Recipient rejection: pending_recipient -> recipient_rejected.
    pub async fn recipient_reject(
        pool: &PgPool,
        id: DbId,
        recipient_id: DbId,
        reason: Option<&str>,
    ) -> Result<Option<TransferRequest>, sqlx::Error> {
        let query = format!(
            "UPDATE transfer_requests SET \
                 status = '{}', recipient_reject_reason = $3, \
                 recipient_responded_at = NOW(), updated_at = NOW() \
             WHERE id = $1 AND to_user_id = $2 AND status = '{}' \
             RETURNING {COLUMNS}",
            statuses::RECIPIENT_REJECTED,
            statuses::PENDING_RECIPIENT,
        );
        sqlx::query_as::<_, TransferRequest>(&query)
            .bind(id)
            .bind(recipient_id)
            .bind(reason)
            .fetch_optional(pool)
            .await
    }

    /// Attach a freshly registered user to requests parked on their phone
    /// number, promoting them to manager review. Returns how many
    /// requests were promoted.
    pub async fn attach_registered_user(
        pool: &PgPool,
        phone_number: &str,
        user_id: DbId,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(&format!(
            "UPDATE transfer_requests SET \
                 to_user_id = $2, status = '{}', updated_at = NOW() \
             WHERE to_phone_number = $1 AND status = '{}'",
            statuses::PENDING_MANAGER,
            statuses::PENDING_REGISTRATION,
        ))
        .bind(phone_number)
        .bind(user_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }
}
