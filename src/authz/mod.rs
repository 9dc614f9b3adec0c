//! Fine-grained permission layer
//!
//! Roles gate routes at the edge; permissions gate features inside a
//! screen ("can this user manage contracts, or only read them?"). The
//! catalog below derives the permission set for a role, and the
//! [`PermissionCache`] keeps a queryable snapshot of the signed-in
//! session's permissions.

pub mod mirror;

pub use mirror::PermissionCache;

use crate::auth::Role;
use std::collections::HashSet;

/// Well-known permission names
pub mod permissions {
    // Dashboard
    pub const DASHBOARD_VIEW: &str = "dashboard.view";

    // Customers
    pub const CUSTOMER_VIEW: &str = "customer.view";
    pub const CUSTOMER_MANAGE: &str = "customer.manage";

    // Employees
    pub const EMPLOYEE_VIEW: &str = "employee.view";
    pub const EMPLOYEE_MANAGE: &str = "employee.manage";

    // Contracts
    pub const CONTRACT_VIEW: &str = "contract.view";
    pub const CONTRACT_MANAGE: &str = "contract.manage";

    // Assignments
    pub const ASSIGNMENT_VIEW: &str = "assignment.view";
    pub const ASSIGNMENT_MANAGE: &str = "assignment.manage";

    // Attendance
    pub const ATTENDANCE_VIEW: &str = "attendance.view";
    pub const ATTENDANCE_MANAGE: &str = "attendance.manage";

    // Payroll
    pub const PAYROLL_VIEW: &str = "payroll.view";
    pub const PAYROLL_MANAGE: &str = "payroll.manage";

    // Supplies
    pub const SUPPLY_VIEW: &str = "supply.view";
    pub const SUPPLY_MANAGE: &str = "supply.manage";

    // Reviews
    pub const REVIEW_VIEW_ALL: &str = "review.view_all";

    // Users
    pub const USER_VIEW: &str = "user.view";
    pub const USER_MANAGE: &str = "user.manage";
}

/// Permission lookup boundary: given a role, the set of fine-grained
/// permission strings it carries.
pub trait PermissionLookup: Send + Sync {
    fn permissions_for(&self, role: Role) -> HashSet<String>;
}

/// The static role -> permissions catalog.
///
/// Must stay consistent with the route-role table in `auth::rules`:
/// every role allowed onto a screen needs at least the matching `.view`
/// permission, or the screen renders as forbidden right after the gate
/// let the request through.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticCatalog;

impl PermissionLookup for StaticCatalog {
    fn permissions_for(&self, role: Role) -> HashSet<String> {
        use permissions::*;

        let granted: &[&str] = match role {
            Role::GeneralManager | Role::DeputyGeneralManager => &[
                DASHBOARD_VIEW,
                CUSTOMER_VIEW,
                CUSTOMER_MANAGE,
                EMPLOYEE_VIEW,
                EMPLOYEE_MANAGE,
                CONTRACT_VIEW,
                CONTRACT_MANAGE,
                ASSIGNMENT_VIEW,
                ASSIGNMENT_MANAGE,
                ATTENDANCE_VIEW,
                ATTENDANCE_MANAGE,
                PAYROLL_VIEW,
                PAYROLL_MANAGE,
                SUPPLY_VIEW,
                SUPPLY_MANAGE,
                REVIEW_VIEW_ALL,
                USER_VIEW,
                USER_MANAGE,
            ],
            Role::RegionalManager => &[
                DASHBOARD_VIEW,
                CUSTOMER_VIEW,
                CUSTOMER_MANAGE,
                EMPLOYEE_VIEW,
                EMPLOYEE_MANAGE,
                CONTRACT_VIEW,
                ASSIGNMENT_VIEW,
                ASSIGNMENT_MANAGE,
                ATTENDANCE_VIEW,
                ATTENDANCE_MANAGE,
                SUPPLY_VIEW,
                SUPPLY_MANAGE,
                REVIEW_VIEW_ALL,
            ],
            Role::Accountant => &[
                DASHBOARD_VIEW,
                CONTRACT_VIEW,
                ATTENDANCE_VIEW,
                PAYROLL_VIEW,
                PAYROLL_MANAGE,
            ],
            Role::Employee => &[DASHBOARD_VIEW, ASSIGNMENT_VIEW, ATTENDANCE_VIEW],
            // Customer accounts live on the public site; they hold no
            // admin permissions at all.
            Role::Customer => &[],
        };

        granted.iter().map(|p| (*p).to_string()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::rules::ROUTE_RULES;

    #[test]
    fn top_management_holds_every_permission() {
        let catalog = StaticCatalog;
        let gm = catalog.permissions_for(Role::GeneralManager);
        for role in [
            Role::DeputyGeneralManager,
            Role::RegionalManager,
            Role::Accountant,
            Role::Employee,
        ] {
            for p in catalog.permissions_for(role) {
                assert!(gm.contains(&p), "general manager missing {p}");
            }
        }
    }

    #[test]
    fn customers_hold_no_admin_permissions() {
        assert!(StaticCatalog.permissions_for(Role::Customer).is_empty());
    }

    /// Every role admitted onto a screen by the route table must hold the
    /// screen's `.view` permission, or the two enforcement layers drift.
    #[test]
    fn catalog_is_consistent_with_route_rules() {
        use permissions::*;

        let screen_permission = |pattern: &str| -> Option<&'static str> {
            match pattern.split('/').nth(2) {
                Some("customers") => Some(CUSTOMER_VIEW),
                Some("employees") => Some(EMPLOYEE_VIEW),
                Some("contracts") => Some(CONTRACT_VIEW),
                Some("assignments") => Some(ASSIGNMENT_VIEW),
                Some("attendance") => Some(ATTENDANCE_VIEW),
                Some("payroll") => Some(PAYROLL_VIEW),
                Some("supplies") => Some(SUPPLY_VIEW),
                Some("reviews") => Some(REVIEW_VIEW_ALL),
                Some("users") => Some(USER_VIEW),
                _ => None,
            }
        };

        let catalog = StaticCatalog;
        for rule in ROUTE_RULES {
            let Some(required) = screen_permission(rule.pattern) else {
                continue;
            };
            for role in rule.allowed {
                assert!(
                    catalog.permissions_for(*role).contains(required),
                    "{role} is routed onto {} but lacks {required}",
                    rule.pattern
                );
            }
        }
    }
}
