//! Well-known role name constants and role gates.
//!
//! These must match the CHECK constraint on `users.role`. The gates
//! here answer "may this role perform that pipeline step" -- they say
//! nothing about whether the caller actually holds the role, which every
//! handler re-reads from the `users` table on each call.

pub const ROLE_CUSTOMER: &str = "customer";
pub const ROLE_SALES_MANAGER: &str = "sales_manager";
pub const ROLE_EXECUTIVE_MANAGER: &str = "executive_manager";
pub const ROLE_FINANCE_MANAGER: &str = "finance_manager";
pub const ROLE_CEO: &str = "ceo";
pub const ROLE_ADMIN: &str = "admin";

/// All valid role names.
pub const VALID_ROLES: &[&str] = &[
    ROLE_CUSTOMER,
    ROLE_SALES_MANAGER,
    ROLE_EXECUTIVE_MANAGER,
    ROLE_FINANCE_MANAGER,
    ROLE_CEO,
    ROLE_ADMIN,
];

/// Returns `true` if the given role name is known.
pub fn is_valid_role(role: &str) -> bool {
    VALID_ROLES.contains(&role)
}

/// Roles with any managerial standing (everything except `customer`).
pub fn is_manager(role: &str) -> bool {
    matches!(
        role,
        ROLE_SALES_MANAGER | ROLE_EXECUTIVE_MANAGER | ROLE_FINANCE_MANAGER | ROLE_CEO | ROLE_ADMIN
    )
}

/// May approve or reject pending orders, and gate transfer requests.
pub fn can_review_orders(role: &str) -> bool {
    matches!(role, ROLE_SALES_MANAGER | ROLE_CEO | ROLE_ADMIN)
}

/// May schedule and drive order execution.
pub fn can_execute_orders(role: &str) -> bool {
    matches!(role, ROLE_EXECUTIVE_MANAGER | ROLE_CEO | ROLE_ADMIN)
}

/// May mark a completed order as paid.
pub fn can_settle_orders(role: &str) -> bool {
    matches!(role, ROLE_FINANCE_MANAGER | ROLE_CEO | ROLE_ADMIN)
}

/// May close a paid order.
pub fn can_close_orders(role: &str) -> bool {
    matches!(role, ROLE_CEO | ROLE_ADMIN)
}

/// May edit shared modules (acquire module locks, save versions).
pub fn can_edit_modules(role: &str) -> bool {
    is_manager(role)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_roles_valid() {
        for role in VALID_ROLES {
            assert!(is_valid_role(role));
        }
    }

    #[test]
    fn test_unknown_role_invalid() {
        assert!(!is_valid_role(""));
        assert!(!is_valid_role("superuser"));
        assert!(!is_valid_role("CUSTOMER"));
    }

    #[test]
    fn test_customer_is_not_manager() {
        assert!(!is_manager(ROLE_CUSTOMER));
        assert!(is_manager(ROLE_SALES_MANAGER));
        assert!(is_manager(ROLE_ADMIN));
    }

    #[test]
    fn test_review_gate() {
        assert!(can_review_orders(ROLE_SALES_MANAGER));
        assert!(can_review_orders(ROLE_CEO));
        assert!(!can_review_orders(ROLE_FINANCE_MANAGER));
        assert!(!can_review_orders(ROLE_CUSTOMER));
    }

    #[test]
    fn test_execute_gate() {
        assert!(can_execute_orders(ROLE_EXECUTIVE_MANAGER));
        assert!(!can_execute_orders(ROLE_SALES_MANAGER));
    }

    #[test]
    fn test_settle_gate() {
        assert!(can_settle_orders(ROLE_FINANCE_MANAGER));
        assert!(!can_settle_orders(ROLE_EXECUTIVE_MANAGER));
    }

    #[test]
    fn test_close_gate_is_ceo_only() {
        assert!(can_close_orders(ROLE_CEO));
        assert!(can_close_orders(ROLE_ADMIN));
        assert!(!can_close_orders(ROLE_FINANCE_MANAGER));
        assert!(!can_close_orders(ROLE_SALES_MANAGER));
    }

    #[test]
    fn test_module_edit_gate() {
        assert!(can_edit_modules(ROLE_SALES_MANAGER));
        assert!(!can_edit_modules(ROLE_CUSTOMER));
    }
}
