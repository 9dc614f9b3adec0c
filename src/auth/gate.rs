//! Edge authorization gate
//!
//! Middleware that runs before any admin handler and decides
//! allow/redirect per request, in priority order:
//!
//! 1. admin path, not the login page, no session cookie -> login page
//! 2. login page with a session cookie present -> dashboard root
//! 3. any other admin path with a cookie -> decode token, extract role,
//!    resolve the route's declared roles; deny (redirect to the
//!    dashboard root) unless the role is in the declared set
//! 4. everything else passes through untouched
//!
//! The dashboard root is exempt from the role check: it is the common
//! landing page for every authenticated role and must never itself
//! trigger a redirect. Failure semantics differ by layer: a token that
//! cannot be decoded, or a role that cannot be extracted, is a deny on
//! any route with a declared rule (fail-closed), while a route with no
//! rule at all falls under the configured default policy.

use crate::auth::matcher::RouteTable;
use crate::auth::{decode_unverified, Role};
use crate::config::DefaultPolicy;
use crate::state::SharedState;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use tracing::debug;

/// Request-intercepting authorization gate over the admin prefix.
pub async fn admin_gate(
    State(state): State<SharedState>,
    request: Request,
    next: Next,
) -> Response {
    let auth = &state.settings.auth;
    let path = request.uri().path().to_owned();

    if !is_admin_path(&path, &auth.admin_prefix) {
        return next.run(request).await;
    }

    let login_path = format!("{}/login", auth.admin_prefix);
    let jar = CookieJar::from_headers(request.headers());
    let token = jar.get(&auth.cookie_name).map(|c| c.value().to_owned());

    if path == login_path {
        if token.is_some() {
            return Redirect::temporary(&auth.admin_prefix).into_response();
        }
        return next.run(request).await;
    }

    let Some(token) = token else {
        debug!(%path, "no session cookie on admin path");
        return Redirect::temporary(&login_path).into_response();
    };

    // Common landing page for all authenticated roles; checking it would
    // turn every deny into a redirect loop.
    if path == auth.admin_prefix {
        return next.run(request).await;
    }

    let Some(allowed) = RouteTable::shared().resolve(&path) else {
        return match auth.default_policy {
            DefaultPolicy::Allow => next.run(request).await,
            DefaultPolicy::Deny => {
                debug!(%path, "undeclared admin route denied by policy");
                Redirect::temporary(&auth.admin_prefix).into_response()
            }
        };
    };

    let role = decode_unverified(&token).and_then(|claims| match Role::from_claims(&claims) {
        Ok(role) => Some(role),
        Err(err) => {
            debug!(%path, %err, "could not extract role from session token");
            None
        }
    });

    match role {
        Some(role) if allowed.contains(&role) => next.run(request).await,
        Some(role) => {
            debug!(%path, %role, "role not allowed for route");
            Redirect::temporary(&auth.admin_prefix).into_response()
        }
        None => Redirect::temporary(&auth.admin_prefix).into_response(),
    }
}

/// True when `path` is the admin prefix itself or lives under it.
/// `starts_with` alone would also capture unrelated siblings such as
/// `/administration`.
fn is_admin_path(path: &str, prefix: &str) -> bool {
    path == prefix
        || path
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.starts_with('/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_path_detection_respects_segment_boundaries() {
        assert!(is_admin_path("/admin", "/admin"));
        assert!(is_admin_path("/admin/payroll", "/admin"));
        assert!(is_admin_path("/admin/", "/admin"));
        assert!(!is_admin_path("/administration", "/admin"));
        assert!(!is_admin_path("/", "/admin"));
        assert!(!is_admin_path("/api/auth/login", "/admin"));
    }
}
