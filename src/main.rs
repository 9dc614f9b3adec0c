//! CleanOps Admin - role-gated back office for an industrial cleaning company
//!
//! The public marketing site and the business API are separate systems;
//! this binary serves the admin console surface and enforces who may
//! open which screen:
//! - Edge gate: every admin-prefixed request is checked against the
//!   route-role table before any handler runs (redirects, never errors)
//! - Permission layer: inside a screen, fine-grained capabilities decide
//!   what the session may see and do (rendered "no access", never a
//!   redirect)

use cleanops_admin::config::Settings;
use cleanops_admin::routes::create_router;
use cleanops_admin::state::AppState;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing subscriber for structured logging
    init_tracing();

    info!("🚀 Starting CleanOps Admin - back-office gateway...");

    // Load configuration
    let settings = Settings::load()?;
    info!("📋 Configuration loaded successfully");

    let addr = SocketAddr::from((settings.server.host, settings.server.port));
    let refresh_interval = Duration::from_millis(settings.auth.refresh_interval_ms);

    // Build shared state: session store, permission cache, seeded accounts
    let state = AppState::initialize(settings).await?;
    state.permissions.start_refresh(refresh_interval);
    info!("✅ Session context hydrated, permission cache running");

    // Build the router
    let app = create_router(state);

    info!("🌐 Server listening on http://{}", addr);
    info!("");
    info!("📚 Endpoints:");
    info!("   ─── Session API ───");
    info!("   POST /api/auth/login        - Sign in, sets the session cookie");
    info!("   POST /api/auth/logout       - Sign out, clears the session");
    info!("   GET  /api/auth/me           - Current user");
    info!("   GET  /api/auth/permissions  - Permission snapshot");
    info!("");
    info!("   ─── Admin console (role-gated at the edge) ───");
    info!("   GET  /admin                 - Dashboard (landing page for all roles)");
    info!("   GET  /admin/login           - Login screen");
    info!("   GET  /admin/customers       - Customers (+ /{{id}})");
    info!("   GET  /admin/employees       - Employees (+ /{{id}})");
    info!("   GET  /admin/contracts       - Contracts (+ /{{id}})");
    info!("   GET  /admin/assignments     - Work assignments");
    info!("   GET  /admin/attendance      - Attendance");
    info!("   GET  /admin/payroll         - Payroll");
    info!("   GET  /admin/supplies        - Supplies");
    info!("   GET  /admin/reviews         - Customer reviews");
    info!("   GET  /admin/users           - Staff accounts (+ /{{id}})");
    info!("");

    // Create TCP listener and serve
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("👋 Server shutdown complete");
    Ok(())
}

/// Initialize tracing with structured logging
fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,cleanops_admin=debug,tower_http=debug"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_level(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true)
                .compact(),
        )
        .init();
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("📴 Received Ctrl+C signal, initiating graceful shutdown...");
        },
        _ = terminate => {
            info!("📴 Received terminate signal, initiating graceful shutdown...");
        },
    }
}
