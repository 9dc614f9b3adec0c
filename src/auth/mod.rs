//! Authentication and authorization module
//!
//! Provides token issuance/decoding, the declarative route-role table,
//! the route matcher, and the edge authorization gate middleware.

pub mod gate;
pub mod matcher;
mod password;
pub mod rules;
pub mod token;

pub use gate::admin_gate;
pub use password::{hash_password, verify_password};
pub use token::{decode_unverified, issue_token, TokenClaims};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Prefix some issuers attach to role claims (e.g. `ROLE_ACCOUNTANT`).
/// Stripped during extraction before matching against the catalogue.
pub const ROLE_CLAIM_PREFIX: &str = "ROLE_";

/// Organizational roles for authorization.
///
/// Roles are a flat catalogue, not a hierarchy: every route and permission
/// decision is plain set membership.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// Runs a regional branch: field staff, customers, supplies
    RegionalManager,
    /// Top management
    GeneralManager,
    /// Top management, second tier
    DeputyGeneralManager,
    /// Payroll and contract bookkeeping
    Accountant,
    /// Cleaning staff
    Employee,
    /// Client-side account on the public site
    Customer,
}

impl Role {
    /// Canonical wire token for this role.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::RegionalManager => "REGIONAL_MANAGER",
            Role::GeneralManager => "GENERAL_MANAGER",
            Role::DeputyGeneralManager => "DEPUTY_GENERAL_MANAGER",
            Role::Accountant => "ACCOUNTANT",
            Role::Employee => "EMPLOYEE",
            Role::Customer => "CUSTOMER",
        }
    }

    /// Parse a single normalized role token. Case-insensitive; a leading
    /// `ROLE_` prefix must already be stripped by the caller.
    pub fn from_token(token: &str) -> Option<Role> {
        match token.trim().to_uppercase().as_str() {
            "REGIONAL_MANAGER" => Some(Role::RegionalManager),
            "GENERAL_MANAGER" => Some(Role::GeneralManager),
            "DEPUTY_GENERAL_MANAGER" => Some(Role::DeputyGeneralManager),
            "ACCOUNTANT" => Some(Role::Accountant),
            "EMPLOYEE" => Some(Role::Employee),
            "CUSTOMER" => Some(Role::Customer),
            _ => None,
        }
    }

    /// Extract the role from a decoded token payload.
    ///
    /// Token issuers in the wild carry the role claim in several shapes.
    /// Precedence, first present non-empty field wins:
    /// 1. `role`  - single string, optional `ROLE_` prefix stripped
    /// 2. `authority` - alternate key name, used verbatim
    /// 3. `roles` - array of strings, first element, prefix stripped
    /// 4. `sub`   - last-resort fallback, uppercased as-is
    ///
    /// The winning field is terminal: an unrecognized value there is an
    /// error, not a reason to fall through to the next shape.
    pub fn from_claims(claims: &TokenClaims) -> Result<Role, RoleError> {
        if let Some(raw) = non_empty(claims.role.as_deref()) {
            return Self::parse_prefixed(raw);
        }
        if let Some(raw) = non_empty(claims.authority.as_deref()) {
            let token = raw.trim().to_uppercase();
            return Role::from_token(&token).ok_or(RoleError::Unknown(token));
        }
        if let Some(raw) = claims
            .roles
            .as_deref()
            .and_then(|list| list.first())
            .map(String::as_str)
            .and_then(|s| non_empty(Some(s)))
        {
            return Self::parse_prefixed(raw);
        }
        if let Some(raw) = non_empty(claims.sub.as_deref()) {
            let token = raw.trim().to_uppercase();
            return Role::from_token(&token).ok_or(RoleError::Unknown(token));
        }
        Err(RoleError::MissingClaim)
    }

    fn parse_prefixed(raw: &str) -> Result<Role, RoleError> {
        let token = raw.trim().to_uppercase();
        let stripped = token
            .strip_prefix(ROLE_CLAIM_PREFIX)
            .unwrap_or(token.as_str());
        Role::from_token(stripped).ok_or_else(|| RoleError::Unknown(stripped.to_string()))
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a role could not be extracted from a token payload
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoleError {
    #[error("no role claim present in token payload")]
    MissingClaim,

    #[error("unrecognized role token: {0}")]
    Unknown(String),
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn claims() -> TokenClaims {
        TokenClaims {
            role: None,
            authority: None,
            roles: None,
            sub: None,
            iat: 0,
            exp: 0,
        }
    }

    #[test]
    fn role_field_strips_prefix_and_uppercases() {
        let mut c = claims();
        c.role = Some("role_accountant".to_string());
        assert_eq!(Role::from_claims(&c), Ok(Role::Accountant));
    }

    #[test]
    fn role_field_without_prefix() {
        let mut c = claims();
        c.role = Some("Employee".to_string());
        assert_eq!(Role::from_claims(&c), Ok(Role::Employee));
    }

    #[test]
    fn primary_role_field_wins_over_subject_fallback() {
        let mut c = claims();
        c.role = Some("ROLE_GENERAL_MANAGER".to_string());
        c.sub = Some("customer".to_string());
        assert_eq!(Role::from_claims(&c), Ok(Role::GeneralManager));
    }

    #[test]
    fn authority_field_used_when_role_absent() {
        let mut c = claims();
        c.authority = Some("deputy_general_manager".to_string());
        assert_eq!(Role::from_claims(&c), Ok(Role::DeputyGeneralManager));
    }

    #[test]
    fn roles_array_takes_first_element() {
        let mut c = claims();
        c.roles = Some(vec![
            "ROLE_REGIONAL_MANAGER".to_string(),
            "ROLE_EMPLOYEE".to_string(),
        ]);
        assert_eq!(Role::from_claims(&c), Ok(Role::RegionalManager));
    }

    #[test]
    fn subject_fallback_is_uppercased() {
        let mut c = claims();
        c.sub = Some("employee".to_string());
        assert_eq!(Role::from_claims(&c), Ok(Role::Employee));
    }

    #[test]
    fn empty_fields_fall_through_to_next_shape() {
        let mut c = claims();
        c.role = Some("  ".to_string());
        c.authority = Some(String::new());
        c.sub = Some("accountant".to_string());
        assert_eq!(Role::from_claims(&c), Ok(Role::Accountant));
    }

    #[test]
    fn missing_all_claims_is_an_error() {
        assert_eq!(Role::from_claims(&claims()), Err(RoleError::MissingClaim));
    }

    #[test]
    fn unknown_token_in_winning_field_is_terminal() {
        let mut c = claims();
        c.role = Some("ROLE_WIZARD".to_string());
        c.sub = Some("employee".to_string());
        assert_eq!(
            Role::from_claims(&c),
            Err(RoleError::Unknown("WIZARD".to_string()))
        );
    }
}
