//! Session token management
//!
//! Issues signed compact tokens for the session cookie and extracts
//! payloads from inbound tokens.
//!
//! The two halves are deliberately asymmetric: `issue_token` signs with
//! the configured secret, while `decode_unverified` performs a purely
//! structural extraction with no signature check. Trust in the cookie is
//! established at issuance; the edge gate only needs the role claim to
//! pick a redirect, and a forged claim still cannot reach data, since
//! every API call re-checks permissions server-side.

use crate::auth::Role;
use crate::error::AppError;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Claims carried in the session token payload.
///
/// Role information may arrive under several keys depending on the
/// issuer; all accepted shapes are modeled here and resolved in one
/// place by [`Role::from_claims`]. Unknown fields are ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Single role string, optionally `ROLE_`-prefixed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Alternate key some issuers use for the same claim
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authority: Option<String>,
    /// Array shape; only the first element is considered
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roles: Option<Vec<String>>,
    /// Subject, also the last-resort role fallback
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    /// Issued at (Unix timestamp)
    #[serde(default)]
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    #[serde(default)]
    pub exp: i64,
}

/// Create a signed session token for an authenticated user.
pub fn issue_token(
    username: &str,
    role: Role,
    secret: &str,
    ttl_hours: i64,
) -> Result<String, AppError> {
    let now = Utc::now();
    let claims = TokenClaims {
        role: Some(format!("{}{}", super::ROLE_CLAIM_PREFIX, role)),
        authority: None,
        roles: None,
        sub: Some(username.to_string()),
        iat: now.timestamp(),
        exp: (now + Duration::hours(ttl_hours)).timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("Failed to issue session token: {}", e)))
}

/// Extract the payload of a compact three-segment token without
/// verifying its signature.
///
/// Total over arbitrary input: every malformed shape (wrong segment
/// count, invalid base64url, unparsable JSON) returns `None`, never
/// panics. Callers treat `None` as "no valid role".
pub fn decode_unverified(token: &str) -> Option<TokenClaims> {
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        debug!(segments = parts.len(), "token is not a three-segment compact token");
        return None;
    }

    let raw = match URL_SAFE_NO_PAD.decode(parts[1]) {
        Ok(bytes) => bytes,
        Err(err) => {
            debug!(%err, "token payload is not valid base64url");
            return None;
        }
    };

    match serde_json::from_slice(&raw) {
        Ok(claims) => Some(claims),
        Err(err) => {
            debug!(%err, "token payload is not a JSON object");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SECRET: &str = "test-secret-with-enough-length";

    #[test]
    fn decode_recovers_issued_claims() {
        let token = issue_token("lan.tran", Role::Accountant, SECRET, 12).unwrap();
        let claims = decode_unverified(&token).expect("issued token must decode");
        assert_eq!(claims.role.as_deref(), Some("ROLE_ACCOUNTANT"));
        assert_eq!(claims.sub.as_deref(), Some("lan.tran"));
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn decode_is_total_over_junk_input() {
        for junk in [
            "",
            ".",
            "..",
            "...",
            "not-a-token",
            "one.two",
            "one.two.three.four",
            "head.!!not-base64!!.sig",
            "head.,.sig",
        ] {
            assert_eq!(decode_unverified(junk).map(|c| c.sub), None, "input: {junk:?}");
        }
    }

    #[test]
    fn decode_rejects_non_json_payload() {
        let payload = URL_SAFE_NO_PAD.encode(b"plain text, not json");
        let token = format!("header.{}.signature", payload);
        assert!(decode_unverified(&token).is_none());
    }

    #[test]
    fn decode_accepts_unsigned_token_with_fabricated_signature() {
        // Structural extraction only: the signature segment is never checked.
        let payload = URL_SAFE_NO_PAD.encode(br#"{"roles":["ROLE_EMPLOYEE"],"sub":"x"}"#);
        let token = format!("eyJhbGciOiJIUzI1NiJ9.{}.forged", payload);
        let claims = decode_unverified(&token).expect("structurally valid token");
        assert_eq!(
            claims.roles.as_deref(),
            Some(&["ROLE_EMPLOYEE".to_string()][..])
        );
    }

    #[test]
    fn decode_ignores_unknown_payload_fields() {
        let payload = URL_SAFE_NO_PAD.encode(br#"{"role":"ROLE_CUSTOMER","lang":"vi","iat":1}"#);
        let token = format!("h.{}.s", payload);
        let claims = decode_unverified(&token).expect("unknown fields are ignored");
        assert_eq!(claims.role.as_deref(), Some("ROLE_CUSTOMER"));
        assert_eq!(claims.iat, 1);
    }
}
