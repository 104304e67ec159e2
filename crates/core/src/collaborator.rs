//! Collaborator invitation constants and rules.

/// Hard cap on non-rejected collaborators per order.
pub const MAX_ACTIVE_COLLABORATORS: i64 = 5;

pub mod statuses {
    /// Invited, waiting for the invitee's answer.
    pub const PENDING: &str = "pending";
    /// Invitee accepted; counts toward the roster cap.
    pub const ACCEPTED: &str = "accepted";
    /// Invitee declined. Does not count toward the cap and is not
    /// reusable -- a fresh invite creates a new row.
    pub const REJECTED: &str = "rejected";
}

/// All valid collaborator statuses.
pub const VALID_STATUSES: &[&str] = &[
    statuses::PENDING,
    statuses::ACCEPTED,
    statuses::REJECTED,
];

/// Returns `true` if the given status name is known.
pub fn is_valid_status(status: &str) -> bool {
    VALID_STATUSES.contains(&status)
}

/// Returns `true` if the row occupies a roster slot.
pub fn counts_toward_cap(status: &str) -> bool {
    status != statuses::REJECTED
}

/// Validate that the roster has room for one more active collaborator.
pub fn validate_roster_capacity(active_count: i64) -> Result<(), String> {
    if active_count >= MAX_ACTIVE_COLLABORATORS {
        return Err(format!(
            "Order already has {MAX_ACTIVE_COLLABORATORS} active collaborators"
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_names() {
        assert!(is_valid_status("pending"));
        assert!(is_valid_status("accepted"));
        assert!(is_valid_status("rejected"));
        assert!(!is_valid_status("invited"));
    }

    #[test]
    fn test_rejected_frees_a_slot() {
        assert!(counts_toward_cap(statuses::PENDING));
        assert!(counts_toward_cap(statuses::ACCEPTED));
        assert!(!counts_toward_cap(statuses::REJECTED));
    }

    #[test]
    fn test_capacity_below_cap() {
        assert!(validate_roster_capacity(0).is_ok());
        assert!(validate_roster_capacity(4).is_ok());
    }

    #[test]
    fn test_capacity_at_cap() {
        let result = validate_roster_capacity(5);
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("5 active collaborators"));
    }

    #[test]
    fn test_capacity_over_cap() {
        assert!(validate_roster_capacity(6).is_err());
    }
}
