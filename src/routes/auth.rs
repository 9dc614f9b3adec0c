//! Authentication route handlers
//!
//! Login, logout, current-user, and permission-snapshot endpoints. Login
//! issues the signed session cookie the edge gate later reads; logout
//! clears it and the persisted session record.

use crate::auth::{issue_token, verify_password, Role};
use crate::error::AppError;
use crate::session::{AuthenticatedUser, SessionState};
use crate::state::SharedState;
use crate::users::User;
use axum::{extract::State, Json};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use validator::Validate;

// ============================================
// Request/Response Types
// ============================================

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "username is required"))]
    pub username: String,
    #[validate(length(min = 8, message = "password must be at least 8 characters"))]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: String,
    pub username: String,
    pub name: String,
    pub role: Role,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.to_string(),
            username: user.username.clone(),
            name: user.name.clone(),
            role: user.role,
        }
    }
}

impl From<&AuthenticatedUser> for UserResponse {
    fn from(user: &AuthenticatedUser) -> Self {
        Self {
            id: user.id.to_string(),
            username: user.username.clone(),
            name: user.name.clone(),
            role: user.role,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub success: bool,
    pub user: UserResponse,
    /// Where the console navigates after login
    pub redirect: String,
}

#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    pub success: bool,
    /// Where the console navigates after logout
    pub redirect: String,
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub success: bool,
    pub user: UserResponse,
}

#[derive(Debug, Serialize)]
pub struct PermissionsResponse {
    pub success: bool,
    pub role: Option<Role>,
    pub permissions: Vec<String>,
}

// ============================================
// Route Handlers
// ============================================

/// POST /api/auth/login
///
/// Authenticate with username and password; sets the session cookie and
/// persists the authenticated-user record.
pub async fn login(
    State(state): State<SharedState>,
    jar: CookieJar,
    Json(req): Json<LoginRequest>,
) -> Result<(CookieJar, Json<AuthResponse>), AppError> {
    req.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let user = state
        .users
        .find_by_username(&req.username)
        .await
        .ok_or_else(|| AppError::Unauthorized("Invalid username or password".to_string()))?;

    if !verify_password(&req.password, &user.password_hash)? {
        return Err(AppError::Unauthorized(
            "Invalid username or password".to_string(),
        ));
    }

    let auth = &state.settings.auth;
    let token = issue_token(&user.username, user.role, &auth.jwt_secret, auth.token_ttl_hours)?;

    state.session.login(AuthenticatedUser {
        id: user.id,
        username: user.username.clone(),
        name: user.name.clone(),
        role: user.role,
        issued_at: Utc::now(),
    })?;

    let cookie = Cookie::build((auth.cookie_name.clone(), token))
        .path("/")
        .http_only(true)
        .build();

    Ok((
        jar.add(cookie),
        Json(AuthResponse {
            success: true,
            user: UserResponse::from(&user),
            redirect: auth.admin_prefix.clone(),
        }),
    ))
}

/// POST /api/auth/logout
///
/// Clear the persisted session record and remove the session cookie.
pub async fn logout(
    State(state): State<SharedState>,
    jar: CookieJar,
) -> Result<(CookieJar, Json<LogoutResponse>), AppError> {
    state.session.logout()?;

    let auth = &state.settings.auth;
    let removal = Cookie::build((auth.cookie_name.clone(), ""))
        .path("/")
        .build();

    Ok((
        jar.remove(removal),
        Json(LogoutResponse {
            success: true,
            redirect: format!("{}/login", auth.admin_prefix),
        }),
    ))
}

/// GET /api/auth/me
///
/// Current authenticated user, from the session context.
pub async fn me(State(state): State<SharedState>) -> Result<Json<MeResponse>, AppError> {
    match state.session.current() {
        SessionState::Authenticated(user) => Ok(Json(MeResponse {
            success: true,
            user: UserResponse::from(&user),
        })),
        _ => Err(AppError::Unauthorized("No active session".to_string())),
    }
}

/// GET /api/auth/permissions
///
/// Snapshot of the signed-in session's role and permission set, as the
/// console's feature gates see it.
pub async fn permissions(State(state): State<SharedState>) -> Json<PermissionsResponse> {
    let mut permissions: Vec<String> = state.permissions.permissions().into_iter().collect();
    permissions.sort();

    Json(PermissionsResponse {
        success: true,
        role: state.permissions.role(),
        permissions,
    })
}
