//! Audit store API server entry point.

use std::sync::Arc;

use auditlog_api::config::ServerConfig;
use auditlog_api::error::AppError;
use auditlog_api::state::AppState;
use auditlog_api::{build_router, telemetry};
use auditlog_core::clock::SystemClock;
use auditlog_store::pg_audit_repository::PgAuditRepository;
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // Read configuration from environment.
    let config = ServerConfig::from_env()?;

    let telemetry = telemetry::init("auditlog-api", config.otlp_endpoint.as_deref())?;

    tracing::info!("Starting audit store API server");

    // Create database connection pool and bring the schema up to date.
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.database_url)
        .await?;
    sqlx::migrate!("../../migrations").run(&pool).await?;

    // Build application state.
    let app_state = AppState::new(
        Arc::new(SystemClock),
        Arc::new(PgAuditRepository::new(pool.clone())),
    );

    // TODO: Replace CorsLayer::permissive() with the CRM front-end origins once they are fixed.
    let app = build_router(app_state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    // Start server.
    let addr = config.socket_addr()?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped, closing database pool");
    pool.close().await;
    telemetry.shutdown();

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
    }
}
