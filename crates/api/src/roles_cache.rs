//! Short-TTL role hint cache.
//!
//! Backs the `/auth/me/capabilities` endpoint so the UI can decide what
//! to show without a store read on every render. Explicitly
//! non-authoritative: every mutating handler re-reads the caller's role
//! from the `users` table, so a stale entry here can at worst mislead a
//! menu, never an authorization check.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use darbast_core::types::DbId;
use darbast_db::repositories::UserRepo;
use darbast_db::DbPool;
use tokio::sync::RwLock;

/// Default entry lifetime.
const DEFAULT_TTL_SECS: u64 = 30;

struct Entry {
    role: String,
    loaded_at: Instant,
}

/// Read-through cache of user roles with a short TTL.
pub struct RoleCache {
    ttl: Duration,
    entries: RwLock<HashMap<DbId, Entry>>,
}

impl RoleCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// The user's role: fresh from cache, or loaded from the store.
    ///
    /// `None` means the user does not exist or is deactivated.
    pub async fn get(&self, pool: &DbPool, user_id: DbId) -> Result<Option<String>, sqlx::Error> {
        {
            let entries = self.entries.read().await;
            if let Some(entry) = entries.get(&user_id) {
                if entry.loaded_at.elapsed() < self.ttl {
                    return Ok(Some(entry.role.clone()));
                }
            }
        }

        let role = UserRepo::get_role(pool, user_id).await?;
        if let Some(role) = &role {
            let mut entries = self.entries.write().await;
            entries.insert(
                user_id,
                Entry {
                    role: role.clone(),
                    loaded_at: Instant::now(),
                },
            );
        }
        Ok(role)
    }

    /// Drop a user's entry (after an admin role change).
    pub async fn invalidate(&self, user_id: DbId) {
        self.entries.write().await.remove(&user_id);
    }
}

impl Default for RoleCache {
    fn default() -> Self {
        Self::new(Duration::from_secs(DEFAULT_TTL_SECS))
    }
}
