//! Admin screen handlers
//!
//! One endpoint per back-office screen. The edge gate has already done
//! the coarse role check by the time these run; each handler re-checks
//! the fine-grained permission and returns the data envelope the screen
//! renders. A denial here is a rendered "no access" state with a 403
//! body, never a redirect: the gate guards route entry, this layer
//! guards what happens after.
//!
//! The business payloads themselves come from the external service API;
//! these envelopes carry the screen identity and the capability flags
//! the UI needs to decide which actions to offer.

use crate::authz::permissions;
use crate::error::{forbidden_error, AppError};
use crate::state::SharedState;
use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;

/// Sidebar sections in display order, with the permission that makes
/// each visible. Mirrors the route-role table: a section the gate would
/// refuse never shows up in the sidebar.
const SECTIONS: &[(&str, &str)] = &[
    ("customers", permissions::CUSTOMER_VIEW),
    ("employees", permissions::EMPLOYEE_VIEW),
    ("contracts", permissions::CONTRACT_VIEW),
    ("assignments", permissions::ASSIGNMENT_VIEW),
    ("attendance", permissions::ATTENDANCE_VIEW),
    ("payroll", permissions::PAYROLL_VIEW),
    ("supplies", permissions::SUPPLY_VIEW),
    ("reviews", permissions::REVIEW_VIEW_ALL),
    ("users", permissions::USER_VIEW),
];

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardResponse {
    pub success: bool,
    pub screen: &'static str,
    /// Sections the current session may open
    pub sections: Vec<&'static str>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreenResponse {
    pub success: bool,
    pub screen: &'static str,
    /// Whether the session may mutate this screen's records
    pub can_manage: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailResponse {
    pub success: bool,
    pub screen: &'static str,
    pub id: String,
    pub can_manage: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginScreenResponse {
    pub success: bool,
    pub screen: &'static str,
}

fn require(state: &SharedState, permission: &str, section: &str) -> Result<(), AppError> {
    if state.permissions.has_permission(permission) {
        Ok(())
    } else {
        Err(forbidden_error(section))
    }
}

fn screen(
    state: &SharedState,
    name: &'static str,
    view: &str,
    manage: &str,
) -> Result<Json<ScreenResponse>, AppError> {
    require(state, view, name)?;
    Ok(Json(ScreenResponse {
        success: true,
        screen: name,
        can_manage: state.permissions.has_permission(manage),
    }))
}

fn detail(
    state: &SharedState,
    name: &'static str,
    id: String,
    view: &str,
    manage: &str,
) -> Result<Json<DetailResponse>, AppError> {
    require(state, view, name)?;
    Ok(Json(DetailResponse {
        success: true,
        screen: name,
        id,
        can_manage: state.permissions.has_permission(manage),
    }))
}

/// GET /admin - common landing page for every authenticated role
pub async fn dashboard(State(state): State<SharedState>) -> Json<DashboardResponse> {
    let sections = SECTIONS
        .iter()
        .filter(|&&(_, permission)| state.permissions.has_permission(permission))
        .map(|&(section, _)| section)
        .collect();

    Json(DashboardResponse {
        success: true,
        screen: "dashboard",
        sections,
    })
}

/// GET /admin/login - the only admin page served without a session
pub async fn login_screen() -> Json<LoginScreenResponse> {
    Json(LoginScreenResponse {
        success: true,
        screen: "login",
    })
}

pub async fn customers(
    State(state): State<SharedState>,
) -> Result<Json<ScreenResponse>, AppError> {
    screen(&state, "customers", permissions::CUSTOMER_VIEW, permissions::CUSTOMER_MANAGE)
}

pub async fn customer_detail(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<DetailResponse>, AppError> {
    detail(&state, "customers", id, permissions::CUSTOMER_VIEW, permissions::CUSTOMER_MANAGE)
}

pub async fn employees(
    State(state): State<SharedState>,
) -> Result<Json<ScreenResponse>, AppError> {
    screen(&state, "employees", permissions::EMPLOYEE_VIEW, permissions::EMPLOYEE_MANAGE)
}

pub async fn employee_detail(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<DetailResponse>, AppError> {
    detail(&state, "employees", id, permissions::EMPLOYEE_VIEW, permissions::EMPLOYEE_MANAGE)
}

pub async fn contracts(
    State(state): State<SharedState>,
) -> Result<Json<ScreenResponse>, AppError> {
    screen(&state, "contracts", permissions::CONTRACT_VIEW, permissions::CONTRACT_MANAGE)
}

pub async fn contract_detail(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<DetailResponse>, AppError> {
    detail(&state, "contracts", id, permissions::CONTRACT_VIEW, permissions::CONTRACT_MANAGE)
}

pub async fn assignments(
    State(state): State<SharedState>,
) -> Result<Json<ScreenResponse>, AppError> {
    screen(&state, "assignments", permissions::ASSIGNMENT_VIEW, permissions::ASSIGNMENT_MANAGE)
}

pub async fn attendance(
    State(state): State<SharedState>,
) -> Result<Json<ScreenResponse>, AppError> {
    screen(&state, "attendance", permissions::ATTENDANCE_VIEW, permissions::ATTENDANCE_MANAGE)
}

pub async fn payroll(
    State(state): State<SharedState>,
) -> Result<Json<ScreenResponse>, AppError> {
    screen(&state, "payroll", permissions::PAYROLL_VIEW, permissions::PAYROLL_MANAGE)
}

pub async fn supplies(
    State(state): State<SharedState>,
) -> Result<Json<ScreenResponse>, AppError> {
    screen(&state, "supplies", permissions::SUPPLY_VIEW, permissions::SUPPLY_MANAGE)
}

/// Reviews carry a single coarse capability: seeing the full feed.
pub async fn reviews(
    State(state): State<SharedState>,
) -> Result<Json<ScreenResponse>, AppError> {
    screen(&state, "reviews", permissions::REVIEW_VIEW_ALL, permissions::REVIEW_VIEW_ALL)
}

/// GET /admin/users - the staff account directory, served locally
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsersScreenResponse {
    pub success: bool,
    pub screen: &'static str,
    pub can_manage: bool,
    pub users: Vec<super::auth::UserResponse>,
}

pub async fn users(
    State(state): State<SharedState>,
) -> Result<Json<UsersScreenResponse>, AppError> {
    require(&state, permissions::USER_VIEW, "users")?;

    let users = state
        .users
        .list()
        .await
        .iter()
        .map(super::auth::UserResponse::from)
        .collect();

    Ok(Json(UsersScreenResponse {
        success: true,
        screen: "users",
        can_manage: state.permissions.has_permission(permissions::USER_MANAGE),
        users,
    }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDetailResponse {
    pub success: bool,
    pub screen: &'static str,
    pub can_manage: bool,
    pub user: super::auth::UserResponse,
}

pub async fn user_detail(
    State(state): State<SharedState>,
    Path(id): Path<uuid::Uuid>,
) -> Result<Json<UserDetailResponse>, AppError> {
    require(&state, permissions::USER_VIEW, "users")?;

    let user = state
        .users
        .find_by_id(id)
        .await
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(Json(UserDetailResponse {
        success: true,
        screen: "users",
        can_manage: state.permissions.has_permission(permissions::USER_MANAGE),
        user: super::auth::UserResponse::from(&user),
    }))
}
