//! Lead service entry point.

use std::net::SocketAddr;
use std::time::Duration;

use auditlog_capture::interceptor::AuditInterceptor;
use auditlog_leads::config::LeadsConfig;
use auditlog_leads::error::AppError;
use auditlog_leads::state::LeadsState;
use auditlog_leads::{LEAD_ENTITY_TYPE, build_router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

/// How long queued audit events may take to drain after the server stops.
const AUDIT_FLUSH_GRACE: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // Initialize tracing subscriber.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    tracing::info!("Starting lead service");

    // Read configuration from environment.
    let config = LeadsConfig::from_env()?;

    // Start the audit dispatcher worker.
    let (dispatcher, dispatcher_handle) = config.dispatcher.spawn_http_dispatcher()?;
    let interceptor = AuditInterceptor::new(dispatcher, LEAD_ENTITY_TYPE)
        .with_service_name(&config.dispatcher.service_name);

    let app = build_router(LeadsState::default(), interceptor)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    // Start server.
    let addr = config.socket_addr()?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    // Close the audit queue and deliver what is left in it.
    let stats = dispatcher_handle.shutdown(AUDIT_FLUSH_GRACE).await;
    tracing::info!(
        delivered = stats.delivered,
        failed = stats.failed,
        "Lead service stopped"
    );

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
    }
}
