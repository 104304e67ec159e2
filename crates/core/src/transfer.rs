//! Transfer request status table and transition rules.
//!
//! An order's ownership moves through a two-gate handshake: the current
//! owner files a request, a sales manager approves it, and the recipient
//! accepts it. Requests aimed at a phone number with no account yet park
//! in `pending_registration` until the recipient signs up.

pub mod statuses {
    /// Waiting for a manager to approve the transfer.
    pub const PENDING_MANAGER: &str = "pending_manager";
    /// Manager declined. Terminal.
    pub const MANAGER_REJECTED: &str = "manager_rejected";
    /// Manager approved, waiting for the recipient's answer.
    pub const PENDING_RECIPIENT: &str = "pending_recipient";
    /// Recipient has no account yet; waits for signup, then manager review.
    pub const PENDING_REGISTRATION: &str = "pending_registration";
    /// Recipient declined. Terminal.
    pub const RECIPIENT_REJECTED: &str = "recipient_rejected";
    /// Recipient accepted; ownership has moved. Terminal.
    pub const ACCEPTED: &str = "accepted";
}

/// All valid transfer request statuses.
pub const VALID_STATUSES: &[&str] = &[
    statuses::PENDING_MANAGER,
    statuses::MANAGER_REJECTED,
    statuses::PENDING_RECIPIENT,
    statuses::PENDING_REGISTRATION,
    statuses::RECIPIENT_REJECTED,
    statuses::ACCEPTED,
];

/// Statuses that still admit a transition. At most one request per order
/// may sit in any of these at a time (enforced by a partial unique index).
pub const OPEN_STATUSES: &[&str] = &[
    statuses::PENDING_MANAGER,
    statuses::PENDING_RECIPIENT,
    statuses::PENDING_REGISTRATION,
];

/// Returns `true` if the given status name is known.
pub fn is_valid_status(status: &str) -> bool {
    VALID_STATUSES.contains(&status)
}

/// Returns `true` if the request can still move (not terminal).
pub fn is_open(status: &str) -> bool {
    OPEN_STATUSES.contains(&status)
}

/// Returns `true` if the request is in a terminal status.
///
/// Terminal is permanent: retrying a transfer means filing a new request.
pub fn is_terminal(status: &str) -> bool {
    is_valid_status(status) && !is_open(status)
}

/// Returns `true` if `from -> to` is a legal request transition.
pub fn can_transition(from: &str, to: &str) -> bool {
    matches!(
        (from, to),
        (statuses::PENDING_MANAGER, statuses::PENDING_RECIPIENT)
            | (statuses::PENDING_MANAGER, statuses::MANAGER_REJECTED)
            | (statuses::PENDING_RECIPIENT, statuses::ACCEPTED)
            | (statuses::PENDING_RECIPIENT, statuses::RECIPIENT_REJECTED)
            | (statuses::PENDING_REGISTRATION, statuses::PENDING_MANAGER)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_statuses_valid() {
        for s in VALID_STATUSES {
            assert!(is_valid_status(s));
        }
        assert!(!is_valid_status("completed_badly"));
    }

    #[test]
    fn test_open_vs_terminal_partition() {
        for s in VALID_STATUSES {
            assert_ne!(is_open(s), is_terminal(s), "{s} must be exactly one");
        }
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(is_terminal(statuses::MANAGER_REJECTED));
        assert!(is_terminal(statuses::RECIPIENT_REJECTED));
        assert!(is_terminal(statuses::ACCEPTED));
        assert!(!is_terminal(statuses::PENDING_MANAGER));
        assert!(!is_terminal(statuses::PENDING_REGISTRATION));
    }

    #[test]
    fn test_manager_gate_transitions() {
        assert!(can_transition(
            statuses::PENDING_MANAGER,
            statuses::PENDING_RECIPIENT
        ));
        assert!(can_transition(
            statuses::PENDING_MANAGER,
            statuses::MANAGER_REJECTED
        ));
        // The manager gate cannot be skipped.
        assert!(!can_transition(
            statuses::PENDING_MANAGER,
            statuses::ACCEPTED
        ));
    }

    #[test]
    fn test_recipient_gate_transitions() {
        assert!(can_transition(
            statuses::PENDING_RECIPIENT,
            statuses::ACCEPTED
        ));
        assert!(can_transition(
            statuses::PENDING_RECIPIENT,
            statuses::RECIPIENT_REJECTED
        ));
    }

    #[test]
    fn test_registration_promotes_to_manager_review() {
        assert!(can_transition(
            statuses::PENDING_REGISTRATION,
            statuses::PENDING_MANAGER
        ));
        // Signup never jumps straight to the recipient gate.
        assert!(!can_transition(
            statuses::PENDING_REGISTRATION,
            statuses::PENDING_RECIPIENT
        ));
    }

    #[test]
    fn test_terminal_statuses_have_no_exits() {
        for from in [
            statuses::MANAGER_REJECTED,
            statuses::RECIPIENT_REJECTED,
            statuses::ACCEPTED,
        ] {
            for to in VALID_STATUSES {
                assert!(!can_transition(from, to), "{from} -> {to} must be illegal");
            }
        }
    }
}
