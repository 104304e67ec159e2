//! Order status / execution stage tables and transition rules.
//!
//! An order carries two independent axes: `status` tracks the
//! approval/payment pipeline, `execution_stage` tracks physical work
//! progress. Not every status has a meaningful execution stage -- a draft
//! order is always `not_started`, and stage changes are only accepted
//! while the order is being executed.

use rand::Rng;

// ---------------------------------------------------------------------------
// Statuses (approval/payment pipeline)
// ---------------------------------------------------------------------------

pub mod statuses {
    /// Being edited by the customer, not yet submitted.
    pub const DRAFT: &str = "draft";
    /// Submitted, waiting for sales review.
    pub const PENDING: &str = "pending";
    /// Accepted by sales, waiting for execution scheduling.
    pub const APPROVED: &str = "approved";
    /// Assigned to an executing manager, work not yet started.
    pub const PENDING_EXECUTION: &str = "pending_execution";
    /// Physical work underway.
    pub const IN_PROGRESS: &str = "in_progress";
    /// Work finished, waiting for settlement.
    pub const COMPLETED: &str = "completed";
    /// Settled by finance.
    pub const PAID: &str = "paid";
    /// Closed out by the CEO. Terminal.
    pub const CLOSED: &str = "closed";
    /// Declined during sales review. Terminal.
    pub const REJECTED: &str = "rejected";
}

/// All valid order statuses.
pub const VALID_STATUSES: &[&str] = &[
    statuses::DRAFT,
    statuses::PENDING,
    statuses::APPROVED,
    statuses::PENDING_EXECUTION,
    statuses::IN_PROGRESS,
    statuses::COMPLETED,
    statuses::PAID,
    statuses::CLOSED,
    statuses::REJECTED,
];

/// Returns `true` if the given status name is known.
pub fn is_valid_status(status: &str) -> bool {
    VALID_STATUSES.contains(&status)
}

/// Statuses from which no further pipeline transition is possible.
pub fn is_terminal_status(status: &str) -> bool {
    matches!(status, statuses::CLOSED | statuses::REJECTED)
}

/// Returns `true` if `from -> to` is a legal pipeline transition.
///
/// The pipeline is strictly forward; rejection branches off `pending`.
/// Archival is a flag, not a status, and is not represented here.
pub fn can_transition(from: &str, to: &str) -> bool {
    matches!(
        (from, to),
        (statuses::DRAFT, statuses::PENDING)
            | (statuses::PENDING, statuses::APPROVED)
            | (statuses::PENDING, statuses::REJECTED)
            | (statuses::APPROVED, statuses::PENDING_EXECUTION)
            | (statuses::PENDING_EXECUTION, statuses::IN_PROGRESS)
            | (statuses::IN_PROGRESS, statuses::COMPLETED)
            | (statuses::COMPLETED, statuses::PAID)
            | (statuses::PAID, statuses::CLOSED)
    )
}

// ---------------------------------------------------------------------------
// Execution stages (physical work axis)
// ---------------------------------------------------------------------------

pub mod stages {
    pub const NOT_STARTED: &str = "not_started";
    pub const SITE_SURVEY: &str = "site_survey";
    pub const INSTALLATION: &str = "installation";
    /// Scaffolding erected, rental period running.
    pub const ACTIVE: &str = "active";
    pub const DISMANTLE: &str = "dismantle";
    pub const FINISHED: &str = "finished";
}

/// Execution stages in their natural work order.
pub const STAGE_ORDER: &[&str] = &[
    stages::NOT_STARTED,
    stages::SITE_SURVEY,
    stages::INSTALLATION,
    stages::ACTIVE,
    stages::DISMANTLE,
    stages::FINISHED,
];

/// Returns `true` if the given stage name is known.
pub fn is_valid_stage(stage: &str) -> bool {
    STAGE_ORDER.contains(&stage)
}

/// Returns `true` if a stage change `from -> to` is allowed.
///
/// Stages only move forward; the single backward move permitted is an
/// explicit reset to `not_started` (e.g. a site visit fell through).
pub fn can_change_stage(from: &str, to: &str) -> bool {
    if to == stages::NOT_STARTED {
        return from != stages::NOT_STARTED;
    }
    let from_idx = STAGE_ORDER.iter().position(|s| *s == from);
    let to_idx = STAGE_ORDER.iter().position(|s| *s == to);
    match (from_idx, to_idx) {
        (Some(f), Some(t)) => t > f,
        _ => false,
    }
}

/// Statuses during which the execution stage may change at all.
pub fn stage_is_editable(status: &str) -> bool {
    matches!(
        status,
        statuses::PENDING_EXECUTION | statuses::IN_PROGRESS
    )
}

// ---------------------------------------------------------------------------
// Order codes
// ---------------------------------------------------------------------------

/// Alphabet for order codes. Ambiguous glyphs (0/O, 1/I) are excluded
/// because codes are read out over the phone.
const CODE_ALPHABET: &[u8] = b"23456789ABCDEFGHJKLMNPQRSTUVWXYZ";

/// Number of random characters in an order code after the prefix.
const CODE_LEN: usize = 8;

/// Generate a human-readable order code, e.g. `ORD-7K2MQ9XW`.
///
/// Collisions are possible in principle; the unique index on
/// `orders.code` is the backstop and callers retry on conflict.
pub fn generate_order_code() -> String {
    let mut rng = rand::rng();
    let body: String = (0..CODE_LEN)
        .map(|_| CODE_ALPHABET[rng.random_range(0..CODE_ALPHABET.len())] as char)
        .collect();
    format!("ORD-{body}")
}

#[cfg(test)]
mod tests {
    use super::*;

    // -----------------------------------------------------------------------
    // Status table
    // -----------------------------------------------------------------------

    #[test]
    fn test_all_statuses_valid() {
        for s in VALID_STATUSES {
            assert!(is_valid_status(s));
        }
        assert!(!is_valid_status("unknown"));
    }

    #[test]
    fn test_happy_path_transitions() {
        let path = [
            statuses::DRAFT,
            statuses::PENDING,
            statuses::APPROVED,
            statuses::PENDING_EXECUTION,
            statuses::IN_PROGRESS,
            statuses::COMPLETED,
            statuses::PAID,
            statuses::CLOSED,
        ];
        for pair in path.windows(2) {
            assert!(
                can_transition(pair[0], pair[1]),
                "{} -> {} should be legal",
                pair[0],
                pair[1]
            );
        }
    }

    #[test]
    fn test_rejection_branch() {
        assert!(can_transition(statuses::PENDING, statuses::REJECTED));
        assert!(!can_transition(statuses::APPROVED, statuses::REJECTED));
        assert!(!can_transition(statuses::DRAFT, statuses::REJECTED));
    }

    #[test]
    fn test_no_skipping_ahead() {
        assert!(!can_transition(statuses::DRAFT, statuses::APPROVED));
        assert!(!can_transition(statuses::PENDING, statuses::PAID));
        assert!(!can_transition(statuses::APPROVED, statuses::COMPLETED));
    }

    #[test]
    fn test_no_moving_backward() {
        assert!(!can_transition(statuses::APPROVED, statuses::PENDING));
        assert!(!can_transition(statuses::PAID, statuses::COMPLETED));
    }

    #[test]
    fn test_terminal_statuses_have_no_exits() {
        for s in VALID_STATUSES {
            assert!(!can_transition(statuses::CLOSED, s));
            assert!(!can_transition(statuses::REJECTED, s));
        }
        assert!(is_terminal_status(statuses::CLOSED));
        assert!(is_terminal_status(statuses::REJECTED));
        assert!(!is_terminal_status(statuses::PAID));
    }

    // -----------------------------------------------------------------------
    // Stage table
    // -----------------------------------------------------------------------

    #[test]
    fn test_stages_move_forward() {
        assert!(can_change_stage(stages::NOT_STARTED, stages::SITE_SURVEY));
        assert!(can_change_stage(stages::SITE_SURVEY, stages::INSTALLATION));
        // Skipping forward is allowed (survey not always needed).
        assert!(can_change_stage(stages::NOT_STARTED, stages::INSTALLATION));
    }

    #[test]
    fn test_stages_do_not_move_backward() {
        assert!(!can_change_stage(stages::ACTIVE, stages::INSTALLATION));
        assert!(!can_change_stage(stages::FINISHED, stages::DISMANTLE));
    }

    #[test]
    fn test_stage_reset_to_not_started() {
        assert!(can_change_stage(stages::SITE_SURVEY, stages::NOT_STARTED));
        assert!(!can_change_stage(stages::NOT_STARTED, stages::NOT_STARTED));
    }

    #[test]
    fn test_stage_editable_only_during_execution() {
        assert!(stage_is_editable(statuses::PENDING_EXECUTION));
        assert!(stage_is_editable(statuses::IN_PROGRESS));
        assert!(!stage_is_editable(statuses::DRAFT));
        assert!(!stage_is_editable(statuses::PAID));
    }

    #[test]
    fn test_unknown_stage_rejected() {
        assert!(!is_valid_stage("teardown"));
        assert!(!can_change_stage("teardown", stages::FINISHED));
    }

    // -----------------------------------------------------------------------
    // Order codes
    // -----------------------------------------------------------------------

    #[test]
    fn test_order_code_shape() {
        let code = generate_order_code();
        assert!(code.starts_with("ORD-"));
        assert_eq!(code.len(), 4 + CODE_LEN);
        assert!(code[4..]
            .chars()
            .all(|c| CODE_ALPHABET.contains(&(c as u8))));
    }

    #[test]
    fn test_order_codes_vary() {
        let a = generate_order_code();
        let b = generate_order_code();
        // Not a strict guarantee; collision odds are 1 in 32^8.
        assert_ne!(a, b);
    }
}
