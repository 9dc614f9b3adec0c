//! Declarative route-role table
//!
//! Maps admin route patterns to the roles allowed to open them. Patterns
//! use `[id]`-style single-segment placeholders. The table is static for
//! the process lifetime and consumed only by the route matcher.
//!
//! The dashboard root (`/admin`) and the login page (`/admin/login`) are
//! deliberately absent: both are exempted by the gate itself. Routes not
//! listed here fall under the configured default policy.

use crate::auth::Role;

/// One (pattern, allowed roles) pair
#[derive(Debug, Clone, Copy)]
pub struct RouteRule {
    pub pattern: &'static str,
    pub allowed: &'static [Role],
}

const TOP_MANAGEMENT: &[Role] = &[Role::GeneralManager, Role::DeputyGeneralManager];

const MANAGEMENT: &[Role] = &[
    Role::RegionalManager,
    Role::GeneralManager,
    Role::DeputyGeneralManager,
];

const MANAGEMENT_AND_ACCOUNTING: &[Role] = &[
    Role::RegionalManager,
    Role::GeneralManager,
    Role::DeputyGeneralManager,
    Role::Accountant,
];

const PAYROLL_DESK: &[Role] = &[
    Role::Accountant,
    Role::GeneralManager,
    Role::DeputyGeneralManager,
];

const SCHEDULING: &[Role] = &[
    Role::RegionalManager,
    Role::GeneralManager,
    Role::DeputyGeneralManager,
    Role::Employee,
];

const TIMEKEEPING: &[Role] = &[
    Role::RegionalManager,
    Role::GeneralManager,
    Role::DeputyGeneralManager,
    Role::Accountant,
    Role::Employee,
];

/// The route-role table, in declaration order. Order matters for
/// parameterized patterns: the first matching pattern wins.
pub const ROUTE_RULES: &[RouteRule] = &[
    RouteRule { pattern: "/admin/customers", allowed: MANAGEMENT },
    RouteRule { pattern: "/admin/customers/[id]", allowed: MANAGEMENT },
    RouteRule { pattern: "/admin/employees", allowed: MANAGEMENT },
    RouteRule { pattern: "/admin/employees/[id]", allowed: MANAGEMENT },
    RouteRule { pattern: "/admin/contracts", allowed: MANAGEMENT_AND_ACCOUNTING },
    RouteRule { pattern: "/admin/contracts/[id]", allowed: MANAGEMENT_AND_ACCOUNTING },
    RouteRule { pattern: "/admin/assignments", allowed: SCHEDULING },
    RouteRule { pattern: "/admin/attendance", allowed: TIMEKEEPING },
    RouteRule { pattern: "/admin/payroll", allowed: PAYROLL_DESK },
    RouteRule { pattern: "/admin/supplies", allowed: MANAGEMENT },
    RouteRule { pattern: "/admin/reviews", allowed: MANAGEMENT },
    RouteRule { pattern: "/admin/users", allowed: TOP_MANAGEMENT },
    RouteRule { pattern: "/admin/users/[id]", allowed: TOP_MANAGEMENT },
];
