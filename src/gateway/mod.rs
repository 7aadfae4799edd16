pub mod handlers;
pub mod openapi;
pub mod state;
pub mod types;

use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{get, post},
};
use std::sync::Arc;
use tokio::net::TcpListener;

use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::user_auth::handlers as auth_handlers;
use crate::user_auth::middleware::jwt_auth_middleware;
use state::AppState;

/// Build the complete router over shared state.
pub fn create_router(state: Arc<AppState>) -> Router {
    // ==========================================================================
    // Public auth routes
    // ==========================================================================
    let auth_routes = Router::new()
        .route("/register", post(auth_handlers::register))
        .route("/login", post(auth_handlers::login));

    // ==========================================================================
    // User routes - protected by JWT
    // ==========================================================================
    let user_routes = Router::new()
        .route("/transfer", post(handlers::transfer))
        .route("/add_funds", post(handlers::add_funds))
        .route("/balance", get(handlers::balance))
        .route("/transactions", get(handlers::transactions))
        .route("/profile", get(auth_handlers::profile))
        .route("/logout", post(auth_handlers::logout))
        .layer(from_fn_with_state(state.clone(), jwt_auth_middleware));

    // ==========================================================================
    // Admin routes: register/login are public, lookup requires JWT
    // ==========================================================================
    let admin_protected = Router::new()
        .route("/user", get(auth_handlers::lookup_user))
        .layer(from_fn_with_state(state.clone(), jwt_auth_middleware));

    let admin_routes = Router::new()
        .route("/register", post(auth_handlers::admin_register))
        .route("/login", post(auth_handlers::admin_login))
        .merge(admin_protected);

    Router::new()
        .route("/api/v1/health", get(handlers::health_check))
        .nest("/api/v1/auth", auth_routes)
        .nest("/api/v1/user", user_routes)
        .nest("/api/v1/admin", admin_routes)
        .with_state(state)
        // OpenAPI / Swagger UI (stateless, added after with_state)
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", openapi::ApiDoc::openapi()))
}

/// Start HTTP Gateway server
pub async fn run_server(host: &str, port: u16, state: Arc<AppState>) -> anyhow::Result<()> {
    let app = create_router(state);

    let addr = format!("{}:{}", host, port);
    let listener = TcpListener::bind(&addr).await.map_err(|e| {
        anyhow::anyhow!(
            "failed to bind to {}: {} (port {} may already be in use)",
            addr,
            e,
            port
        )
    })?;

    tracing::info!("Gateway listening on http://{}", addr);
    tracing::info!("API Docs: http://{}/docs", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to install Ctrl+C handler: {}", e);
        // Without a signal handler, serve until the process is killed
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
