//! Shared-module lock scopes, validation, and the change-notification
//! message protocol.
//!
//! A "module" is a named editable surface shared between managers -- the
//! daily crew schedule, the salary sheet, the price list. Locks and saved
//! versions are scoped to `(module_key, module_date)`; date-less modules
//! use a `NULL` date. This module lives in `core` so the DB layer, API
//! handlers, and any push-transport adapter agree on the same keys and
//! message shapes.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::types::{DbId, Timestamp};

// ---------------------------------------------------------------------------
// Module keys (the surfaces that can be locked / versioned)
// ---------------------------------------------------------------------------

pub mod module_keys {
    /// Daily crew and equipment schedule (date-scoped).
    pub const CREW_SCHEDULE: &str = "crew_schedule";
    /// Staff salary settings sheet.
    pub const SALARY_SHEET: &str = "salary_sheet";
    /// Rental price list.
    pub const PRICE_LIST: &str = "price_list";
    /// Contractor whitelist management surface.
    pub const CONTRACTOR_WHITELIST: &str = "contractor_whitelist";
}

/// The set of all lockable module keys.
pub const VALID_MODULE_KEYS: &[&str] = &[
    module_keys::CREW_SCHEDULE,
    module_keys::SALARY_SHEET,
    module_keys::PRICE_LIST,
    module_keys::CONTRACTOR_WHITELIST,
];

/// Module keys whose scope includes a date component.
pub const DATE_SCOPED_MODULE_KEYS: &[&str] = &[module_keys::CREW_SCHEDULE];

/// Returns `true` if the given module key is valid.
pub fn is_valid_module_key(key: &str) -> bool {
    VALID_MODULE_KEYS.contains(&key)
}

/// Validate a module scope: known key, and a date present exactly when
/// the module is date-scoped.
pub fn validate_module_scope(key: &str, date: Option<NaiveDate>) -> Result<(), String> {
    if !is_valid_module_key(key) {
        return Err(format!(
            "Invalid module key '{key}'. Must be one of: {}",
            VALID_MODULE_KEYS.join(", ")
        ));
    }
    let date_scoped = DATE_SCOPED_MODULE_KEYS.contains(&key);
    match (date_scoped, date) {
        (true, None) => Err(format!("Module '{key}' requires a date")),
        (false, Some(_)) => Err(format!("Module '{key}' does not take a date")),
        _ => Ok(()),
    }
}

// ---------------------------------------------------------------------------
// Lock status (derived flags)
// ---------------------------------------------------------------------------

/// Derived view of a lock for one requesting user.
///
/// `read_only` and `is_mine` are mutually exclusive when a lock exists
/// and both `false` when the module is unlocked.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct LockView {
    pub holder_id: Option<DbId>,
    pub acquired_at: Option<Timestamp>,
    pub is_mine: bool,
    pub read_only: bool,
}

impl LockView {
    /// Build the derived view from the current holder (if any) and the
    /// requesting user.
    pub fn for_user(holder: Option<(DbId, Timestamp)>, user_id: DbId) -> Self {
        match holder {
            Some((holder_id, acquired_at)) => Self {
                holder_id: Some(holder_id),
                acquired_at: Some(acquired_at),
                is_mine: holder_id == user_id,
                read_only: holder_id != user_id,
            },
            None => Self {
                holder_id: None,
                acquired_at: None,
                is_mine: false,
                read_only: false,
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Change-notification message protocol
// ---------------------------------------------------------------------------

/// Messages describing module state changes, serialized as JSON with an
/// internally-tagged `"type"` discriminator. The push transport that
/// carries them to browsers is an external collaborator; the backend only
/// produces them and treats them as a "re-fetch now" cue, never as the
/// source of truth.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum ModuleMessage {
    /// A lock changed hands (acquired, released, or taken over).
    #[serde(rename = "module.lock.changed")]
    LockChanged {
        module_key: String,
        module_date: Option<NaiveDate>,
        holder_id: Option<DbId>,
    },

    /// A new version snapshot was saved.
    #[serde(rename = "module.version.saved")]
    VersionSaved {
        module_key: String,
        module_date: Option<NaiveDate>,
        version: i32,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    // -----------------------------------------------------------------------
    // Module key validation
    // -----------------------------------------------------------------------

    #[test]
    fn test_valid_module_keys() {
        assert!(is_valid_module_key("crew_schedule"));
        assert!(is_valid_module_key("salary_sheet"));
        assert!(is_valid_module_key("price_list"));
        assert!(is_valid_module_key("contractor_whitelist"));
    }

    #[test]
    fn test_invalid_module_keys() {
        assert!(!is_valid_module_key(""));
        assert!(!is_valid_module_key("orders"));
        assert!(!is_valid_module_key("SALARY_SHEET"));
    }

    #[test]
    fn test_date_scoped_module_requires_date() {
        assert!(validate_module_scope("crew_schedule", Some(date("2026-08-04"))).is_ok());
        let result = validate_module_scope("crew_schedule", None);
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("requires a date"));
    }

    #[test]
    fn test_dateless_module_rejects_date() {
        assert!(validate_module_scope("salary_sheet", None).is_ok());
        let result = validate_module_scope("salary_sheet", Some(date("2026-08-04")));
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("does not take a date"));
    }

    #[test]
    fn test_unknown_key_rejected() {
        let result = validate_module_scope("payroll", None);
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("Invalid module key"));
    }

    // -----------------------------------------------------------------------
    // LockView
    // -----------------------------------------------------------------------

    #[test]
    fn test_lock_view_unlocked() {
        let view = LockView::for_user(None, 7);
        assert!(!view.is_mine);
        assert!(!view.read_only);
        assert!(view.holder_id.is_none());
    }

    #[test]
    fn test_lock_view_held_by_me() {
        let now = Utc::now();
        let view = LockView::for_user(Some((7, now)), 7);
        assert!(view.is_mine);
        assert!(!view.read_only);
        assert_eq!(view.holder_id, Some(7));
    }

    #[test]
    fn test_lock_view_held_by_other() {
        let now = Utc::now();
        let view = LockView::for_user(Some((3, now)), 7);
        assert!(!view.is_mine);
        assert!(view.read_only);
    }

    // -----------------------------------------------------------------------
    // Message serialization
    // -----------------------------------------------------------------------

    #[test]
    fn test_lock_changed_serialization() {
        let msg = ModuleMessage::LockChanged {
            module_key: "salary_sheet".to_string(),
            module_date: None,
            holder_id: Some(42),
        };
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains(r#""type":"module.lock.changed"#));

        let deserialized: ModuleMessage = serde_json::from_str(&json).unwrap();
        assert_eq!(msg, deserialized);
    }

    #[test]
    fn test_version_saved_serialization() {
        let msg = ModuleMessage::VersionSaved {
            module_key: "crew_schedule".to_string(),
            module_date: Some(date("2026-08-04")),
            version: 12,
        };
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains(r#""type":"module.version.saved"#));

        let deserialized: ModuleMessage = serde_json::from_str(&json).unwrap();
        assert_eq!(msg, deserialized);
    }
}
