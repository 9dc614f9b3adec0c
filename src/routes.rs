//! Route definitions and router setup
//!
//! Configures all routes and middleware. The edge authorization gate is
//! layered over the whole router so it sees every inbound request,
//! including paths no route matches; non-admin paths pass through it
//! untouched.

mod admin;
mod auth;

use crate::auth::admin_gate;
use crate::state::SharedState;
use axum::{
    http::{header, Method},
    middleware,
    routing::{get, post},
    Router,
};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    request_id::MakeRequestUuid,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
    ServiceBuilderExt,
};
use tracing::Level;

/// Create the application router with all routes and middleware
pub fn create_router(state: SharedState) -> Router {
    // Build CORS layer
    let cors = build_cors_layer(&state);

    // Build tracing/logging layer
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_request(DefaultOnRequest::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    // Build middleware stack
    let middleware_stack = ServiceBuilder::new()
        .set_x_request_id(MakeRequestUuid)
        .layer(trace_layer)
        .layer(CompressionLayer::new())
        .layer(cors)
        .propagate_x_request_id();

    // Back-office screens, nested under the configured admin prefix
    let admin_routes = Router::new()
        .route("/", get(admin::dashboard))
        .route("/login", get(admin::login_screen))
        .route("/customers", get(admin::customers))
        .route("/customers/{id}", get(admin::customer_detail))
        .route("/employees", get(admin::employees))
        .route("/employees/{id}", get(admin::employee_detail))
        .route("/contracts", get(admin::contracts))
        .route("/contracts/{id}", get(admin::contract_detail))
        .route("/assignments", get(admin::assignments))
        .route("/attendance", get(admin::attendance))
        .route("/payroll", get(admin::payroll))
        .route("/supplies", get(admin::supplies))
        .route("/reviews", get(admin::reviews))
        .route("/users", get(admin::users))
        .route("/users/{id}", get(admin::user_detail));

    Router::new()
        // Health check
        .route("/health", get(health_check))
        // Session API (outside the gated prefix: login must be reachable
        // without a cookie)
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/auth/me", get(auth::me))
        .route("/api/auth/permissions", get(auth::permissions))
        // Admin surface
        .nest(&state.settings.auth.admin_prefix, admin_routes)
        // The gate must wrap the router itself: it also rules on admin
        // paths that match no route (default-policy decisions).
        .layer(middleware::from_fn_with_state(state.clone(), admin_gate))
        // Apply middleware and state
        .layer(middleware_stack)
        .with_state(state)
}

/// Build CORS layer from settings
fn build_cors_layer(state: &SharedState) -> CorsLayer {
    let origins: Vec<_> = state
        .settings
        .cors
        .allowed_origins
        .iter()
        .filter_map(|s| s.parse().ok())
        .collect();

    if origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT])
            .max_age(Duration::from_secs(3600))
    } else {
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT])
            .max_age(Duration::from_secs(3600))
    }
}

/// Health check endpoint
async fn health_check() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "success": true,
        "message": "Server is running fine.",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION")
    }))
}
