//! API Gateway Library
//!
//! HTTP REST and WebSocket surface over the embedded workshop services.

pub mod config;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use tower_http::trace::TraceLayer;
use tracing::info;

use workshop_service_lib::config::WorkshopServiceConfig;
use workshop_service_lib::events::BroadcastHub;
use workshop_service_lib::infra::Database;
use workshop_service_lib::scheduler::SweepScheduler;
use workshop_service_lib::service::WorkshopServices;

use crate::config::GatewayConfig;
use crate::routes::create_router;
use crate::state::AppState;

/// Wire services, the event hub and the database into the shared state.
pub fn build_state(
    db: Database,
    workshop: &WorkshopServiceConfig,
    config: GatewayConfig,
) -> AppState {
    let hub = BroadcastHub::new();
    let services = WorkshopServices::from_connection(
        db.get_connection(),
        workshop.jwt.clone(),
        &workshop.sweep,
        Arc::new(hub.clone()),
    );

    AppState::new(services, hub, db, config)
}

/// Run the HTTP server until Ctrl+C or SIGTERM.
pub async fn run_server(host: &str, port: u16) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = GatewayConfig::from_env();
    config.host = host.to_string();
    config.port = port;

    let workshop = WorkshopServiceConfig::from_env()?;
    let db = Database::connect(&workshop.database).await?;
    let state = build_state(db, &workshop, config);

    let scheduler = if workshop.sweep.enabled {
        Some(SweepScheduler::new(state.services.sweep(), workshop.sweep.interval).spawn())
    } else {
        info!("Auto-cancel sweep disabled");
        None
    };

    // Build router
    let app = create_router(state).layer(TraceLayer::new_for_http());

    // Build address
    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Gateway listening on {}", addr);

    // Run server
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(handle) = scheduler {
        handle.abort();
    }
    info!("Gateway stopped");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Ctrl+C received, shutting down"),
        _ = terminate => info!("SIGTERM received, shutting down"),
    }
}
