//! HTTP handlers, one module per resource.

pub mod access_grants;
pub mod admin;
pub mod auth;
pub mod collaborators;
pub mod locks;
pub mod notification;
pub mod orders;
pub mod ownership;
pub mod transfers;
pub mod versions;

use darbast_core::error::CoreError;
use darbast_core::types::DbId;
use darbast_db::repositories::UserRepo;
use darbast_db::DbPool;

use crate::error::{AppError, AppResult};

/// Generic permission-denied message. Deliberately does not say whether
/// the target exists or what the caller's actual standing is.
pub(crate) const FORBIDDEN_MSG: &str = "You do not have permission to perform this action";

/// Read the caller's role from the store (never from token claims or the
/// role cache) and check it against a gate.
pub(crate) async fn require_role(
    pool: &DbPool,
    user_id: DbId,
    gate: fn(&str) -> bool,
) -> AppResult<String> {
    let role = UserRepo::get_role(pool, user_id)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::Forbidden(FORBIDDEN_MSG.into())))?;
    if !gate(&role) {
        return Err(AppError::Core(CoreError::Forbidden(FORBIDDEN_MSG.into())));
    }
    Ok(role)
}
