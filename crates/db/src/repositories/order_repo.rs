//! Repository for the `orders` table.
//!
//! Every pipeline transition is a conditional update guarded on the
//! expected prior status. A raced or illegal transition affects zero
//! rows and comes back as `None`; callers map that to a Conflict.

use darbast_core::order::{stages, statuses};
use darbast_core::types::DbId;
use sqlx::{PgPool, Postgres, Transaction};

use crate::models::order::{CreateOrder, Order, UpdateOrder};

/// Column list for `orders` queries.
const COLUMNS: &str = "id, code, customer_id, owner_id, status, execution_stage, \
                       province, city, address_line, postal_code, \
                       is_archived, is_deep_archived, \
                       approved_by, executed_by, transferred_from_user_id, \
                       created_at, updated_at";

/// Provides CRUD and pipeline-transition operations for orders.
pub struct OrderRepo;

impl OrderRepo {
    /// Create a draft order owned by the submitting customer.
    pub async fn create(
        pool: &PgPool,
        customer_id: DbId,
        code: &str,
        input: &CreateOrder,
    ) -> Result<Order, sqlx::Error> {
        let query = format!(
            "INSERT INTO orders (code, customer_id, owner_id, province, city, address_line, postal_code) \
             VALUES ($1, $2, $2, $3, $4, $5, $6) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Order>(&query)
            .bind(code)
            .bind(customer_id)
            .bind(&input.province)
            .bind(&input.city)
            .bind(&input.address_line)
            .bind(&input.postal_code)
            .fetch_one(pool)
            .await
    }

    /// Find an order by id.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Order>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM orders WHERE id = $1");
        sqlx::query_as::<_, Order>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List orders owned by a user, newest first. Deep-archived orders
    /// are always hidden; plain archived orders only when asked.
    pub async fn list_owned(
        pool: &PgPool,
        owner_id: DbId,
        include_archived: bool,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Order>, sqlx::Error> {
        let archive_filter = if include_archived {
            ""
        } else {
            "AND NOT is_archived"
        };
        let query = format!(
            "SELECT {COLUMNS} FROM orders \
             WHERE owner_id = $1 AND NOT is_deep_archived {archive_filter} \
             ORDER BY created_at DESC \
             LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, Order>(&query)
            .bind(owner_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// List orders awaiting a pipeline step (manager work queues).
    pub async fn list_by_status(
        pool: &PgPool,
        status: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Order>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM orders \
             WHERE status = $1 AND NOT is_archived AND NOT is_deep_archived \
             ORDER BY created_at ASC \
             LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, Order>(&query)
            .bind(status)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Patch a draft's address fields. Only the owner, only while draft.
    pub async fn update_draft(
        pool: &PgPool,
        id: DbId,
        owner_id: DbId,
        input: &UpdateOrder,
    ) -> Result<Option<Order>, sqlx::Error> {
        let query = format!(
            "UPDATE orders SET \
                 province = COALESCE($3, province), \
                 city = COALESCE($4, city), \
                 address_line = COALESCE($5, address_line), \
                 postal_code = COALESCE($6, postal_code), \
                 updated_at = NOW() \
             WHERE id = $1 AND owner_id = $2 AND status = 'draft' \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Order>(&query)
            .bind(id)
            .bind(owner_id)
            .bind(&input.province)
            .bind(&input.city)
            .bind(&input.address_line)
            .bind(&input.postal_code)
            .fetch_optional(pool)
            .await
    }

    /// Generic guarded pipeline transition.
    pub async fn transition(
        pool: &PgPool,
        id: DbId,
        from: &str,
        to: &str,
    ) -> Result<Option<Order>, sqlx::Error> {
        let query = format!(
            "UPDATE orders SET status = $3, updated_at = NOW() \
             WHERE id = $1 AND status = $2 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Order>(&query)
            .bind(id)
            .bind(from)
            .bind(to)
            .fetch_optional(pool)
            .await
    }

    /// Submit a draft. Only the owner may submit.
    pub async fn submit(
        pool: &PgPool,
        id: DbId,
        owner_id: DbId,
    ) -> Result<Option<Order>, sqlx::Error> {
        let query = format!(
            "UPDATE orders SET status = '{}', updated_at = NOW() \
             WHERE id = $1 AND owner_id = $2 AND status = '{}' \
             RETURNING {COLUMNS}",
            statuses::PENDING,
            statuses::DRAFT,
        );
        sqlx::query_as::<_, Order>(&query)
            .bind(id)
            .bind(owner_id)
            .fetch_optional(pool)
            .await
    }

    /// Sales approval: pending -> approved, stamping the approver.
    pub async fn approve(
        pool: &PgPool,
        id: DbId,
        manager_id: DbId,
    ) -> Result<Option<Order>, sqlx::Error> {
        let query = format!(
            "UPDATE orders SET status = '{}', approved_by = $2, updated_at = NOW() \
             WHERE id = $1 AND status = '{}' \
             RETURNING {COLUMNS}",
            statuses::APPROVED,
            statuses::PENDING,
        );
        sqlx::query_as::<_, Order>(&query)
            .bind(id)
            .bind(manager_id)
            .fetch_optional(pool)
            .await
    }

    /// Execution scheduling: approved -> pending_execution, stamping the
    /// executing manager.
    pub async fn schedule_execution(
        pool: &PgPool,
        id: DbId,
        manager_id: DbId,
    ) -> Result<Option<Order>, sqlx::Error> {
        let query = format!(
            "UPDATE orders SET status = '{}', executed_by = $2, updated_at = NOW() \
             WHERE id = $1 AND status = '{}' \
             RETURNING {COLUMNS}",
            statuses::PENDING_EXECUTION,
            statuses::APPROVED,
        );
        sqlx::query_as::<_, Order>(&query)
            .bind(id)
            .bind(manager_id)
            .fetch_optional(pool)
            .await
    }

    /// Guarded execution-stage change, only while the order is being
    /// executed. The stage guard makes concurrent stage moves race-safe.
    pub async fn set_stage(
        pool: &PgPool,
        id: DbId,
        from_stage: &str,
        to_stage: &str,
    ) -> Result<Option<Order>, sqlx::Error> {
        let query = format!(
            "UPDATE orders SET execution_stage = $3, updated_at = NOW() \
             WHERE id = $1 AND execution_stage = $2 \
               AND status IN ('{}', '{}') \
             RETURNING {COLUMNS}",
            statuses::PENDING_EXECUTION,
            statuses::IN_PROGRESS,
        );
        sqlx::query_as::<_, Order>(&query)
            .bind(id)
            .bind(from_stage)
            .bind(to_stage)
            .fetch_optional(pool)
            .await
    }

    /// Completing the work also lands the execution stage on `finished`.
    pub async fn complete(pool: &PgPool, id: DbId) -> Result<Option<Order>, sqlx::Error> {
        let query = format!(
            "UPDATE orders SET status = '{}', execution_stage = '{}', updated_at = NOW() \
             WHERE id = $1 AND status = '{}' \
             RETURNING {COLUMNS}",
            statuses::COMPLETED,
            stages::FINISHED,
            statuses::IN_PROGRESS,
        );
        sqlx::query_as::<_, Order>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Set the archived flag. Closed/rejected orders only.
    pub async fn archive(pool: &PgPool, id: DbId) -> Result<Option<Order>, sqlx::Error> {
        let query = format!(
            "UPDATE orders SET is_archived = true, updated_at = NOW() \
             WHERE id = $1 AND NOT is_archived \
               AND status IN ('{}', '{}') \
             RETURNING {COLUMNS}",
            statuses::CLOSED,
            statuses::REJECTED,
        );
        sqlx::query_as::<_, Order>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Deep-archive an already archived order (drops out of all listings).
    pub async fn deep_archive(pool: &PgPool, id: DbId) -> Result<Option<Order>, sqlx::Error> {
        let query = format!(
            "UPDATE orders SET is_deep_archived = true, updated_at = NOW() \
             WHERE id = $1 AND is_archived AND NOT is_deep_archived \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Order>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Lock the order row for the remainder of the transaction. Used to
    /// serialize collaborator roster-cap checks.
    pub async fn lock_row(
        tx: &mut Transaction<'_, Postgres>,
        id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let row: Option<(DbId,)> = sqlx::query_as("SELECT id FROM orders WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut **tx)
            .await?;
        Ok(row.is_some())
    }

    /// Move ownership inside an enclosing transaction, guarded on the
    /// expected current owner.
    pub async fn change_owner(
        tx: &mut Transaction<'_, Postgres>,
        id: DbId,
        prior_owner_id: DbId,
        new_owner_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE orders SET owner_id = $3, transferred_from_user_id = $2, updated_at = NOW() \
             WHERE id = $1 AND owner_id = $2",
        )
        .bind(id)
        .bind(prior_owner_id)
        .bind(new_owner_id)
        .execute(&mut **tx)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
