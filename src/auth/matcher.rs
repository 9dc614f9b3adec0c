//! Route matcher
//!
//! Resolves a concrete request path to its governing route rule. Each
//! declared pattern is compiled once, at table construction, into literal
//! and placeholder segments; no string templating happens per request.
//!
//! Resolution order: exact match over the raw pattern strings first, then
//! the compiled patterns in declaration order. A `[id]` placeholder
//! matches exactly one non-empty segment and never spans a `/`. Paths are
//! compared as-is: a trailing slash is a different path.

use crate::auth::rules::{RouteRule, ROUTE_RULES};
use crate::auth::Role;
use once_cell::sync::Lazy;
use std::collections::HashMap;

/// One compiled pattern segment
#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(&'static str),
    Param,
}

#[derive(Debug)]
struct CompiledRule {
    segments: Vec<Segment>,
    allowed: &'static [Role],
}

impl CompiledRule {
    fn compile(rule: &RouteRule) -> Self {
        let segments = rule
            .pattern
            .split('/')
            .map(|seg| {
                if seg.len() > 2 && seg.starts_with('[') && seg.ends_with(']') {
                    Segment::Param
                } else {
                    Segment::Literal(seg)
                }
            })
            .collect();
        Self {
            segments,
            allowed: rule.allowed,
        }
    }

    fn matches(&self, path: &str) -> bool {
        let mut segments = self.segments.iter();
        let mut parts = path.split('/');
        loop {
            match (segments.next(), parts.next()) {
                (None, None) => return true,
                (Some(Segment::Literal(lit)), Some(part)) if *lit == part => {}
                (Some(Segment::Param), Some(part)) if !part.is_empty() => {}
                _ => return false,
            }
        }
    }
}

/// The compiled route-role table
#[derive(Debug)]
pub struct RouteTable {
    /// Raw pattern string -> rule index; first-registered wins
    exact: HashMap<&'static str, usize>,
    compiled: Vec<CompiledRule>,
}

impl RouteTable {
    /// Compile a rule set. Called once per table; request handling only
    /// ever reads the result.
    pub fn new(rules: &'static [RouteRule]) -> Self {
        let mut exact = HashMap::with_capacity(rules.len());
        let mut compiled = Vec::with_capacity(rules.len());
        for (idx, rule) in rules.iter().enumerate() {
            exact.entry(rule.pattern).or_insert(idx);
            compiled.push(CompiledRule::compile(rule));
        }
        Self { exact, compiled }
    }

    /// The process-wide table over [`ROUTE_RULES`].
    pub fn shared() -> &'static RouteTable {
        static TABLE: Lazy<RouteTable> = Lazy::new(|| RouteTable::new(ROUTE_RULES));
        &TABLE
    }

    /// Resolve a concrete path to its declared role set.
    ///
    /// `None` means no rule is declared for this path; the caller decides
    /// what that implies (the gate applies the configured default
    /// policy). It never means "deny".
    pub fn resolve(&self, path: &str) -> Option<&'static [Role]> {
        if let Some(&idx) = self.exact.get(path) {
            return Some(self.compiled[idx].allowed);
        }
        self.compiled
            .iter()
            .find(|rule| rule.matches(path))
            .map(|rule| rule.allowed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    static TEST_RULES: &[RouteRule] = &[
        RouteRule {
            pattern: "/admin/payroll",
            allowed: &[Role::Accountant],
        },
        RouteRule {
            pattern: "/admin/customers/[id]",
            allowed: &[Role::RegionalManager],
        },
        RouteRule {
            pattern: "/admin/contracts/[id]/addenda/[n]",
            allowed: &[Role::Accountant, Role::GeneralManager],
        },
    ];

    fn table() -> RouteTable {
        RouteTable::new(TEST_RULES)
    }

    #[test]
    fn exact_route_resolves_to_declared_roles() {
        assert_eq!(
            table().resolve("/admin/payroll"),
            Some(&[Role::Accountant][..])
        );
    }

    #[test]
    fn placeholder_matches_any_single_segment() {
        let table = table();
        for id in ["17", "a-b-c", "e58d2c0e", "[id]"] {
            let path = format!("/admin/customers/{}", id);
            assert_eq!(
                table.resolve(&path),
                Some(&[Role::RegionalManager][..]),
                "path: {path}"
            );
        }
    }

    #[test]
    fn placeholder_never_spans_segments() {
        let table = table();
        assert_eq!(table.resolve("/admin/customers/17/contracts"), None);
        assert_eq!(table.resolve("/admin/customers/"), None);
        assert_eq!(table.resolve("/admin/customers"), None);
    }

    #[test]
    fn multiple_placeholders_are_supported() {
        assert_eq!(
            table().resolve("/admin/contracts/31/addenda/2"),
            Some(&[Role::Accountant, Role::GeneralManager][..])
        );
        assert_eq!(table().resolve("/admin/contracts/31/addenda"), None);
    }

    #[test]
    fn undeclared_path_resolves_to_none() {
        assert_eq!(table().resolve("/admin/some-new-page"), None);
        assert_eq!(table().resolve("/"), None);
        assert_eq!(table().resolve(""), None);
    }

    #[test]
    fn trailing_slash_is_a_distinct_path() {
        assert_eq!(table().resolve("/admin/payroll/"), None);
    }

    #[test]
    fn exact_match_takes_precedence_over_patterns() {
        static RULES: &[RouteRule] = &[
            RouteRule {
                pattern: "/admin/reports/[id]",
                allowed: &[Role::Employee],
            },
            RouteRule {
                pattern: "/admin/reports/summary",
                allowed: &[Role::GeneralManager],
            },
        ];
        let table = RouteTable::new(RULES);
        // Declared later, but exact: wins over the earlier pattern.
        assert_eq!(
            table.resolve("/admin/reports/summary"),
            Some(&[Role::GeneralManager][..])
        );
        assert_eq!(
            table.resolve("/admin/reports/weekly"),
            Some(&[Role::Employee][..])
        );
    }

    #[test]
    fn shared_table_covers_the_declared_admin_routes() {
        let table = RouteTable::shared();
        assert!(table.resolve("/admin/users").is_some());
        assert!(table.resolve("/admin/users/42").is_some());
        assert_eq!(table.resolve("/admin"), None);
        assert_eq!(table.resolve("/admin/login"), None);
    }
}
