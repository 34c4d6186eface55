//! amityd - Amity social-graph daemon.
//!
//! Wires the persistent friend-graph store, the in-memory presence/typing
//! registries, and the notification fan-out together, then runs the two
//! periodic maintenance tasks until shutdown.

use amityd::config::Config;
use amityd::db::Database;
use amityd::delivery::DeliveryHub;
use amityd::services::{
    spawn_request_cleanup_task, spawn_typing_sweep_task, FriendRequestService, Notifier,
    TypingService,
};
use amityd::state::{PresenceRegistry, TypingTracker};
use amityd::{http, metrics};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.toml".to_string());

    let config = Config::load(&config_path).map_err(|e| {
        error!(path = %config_path, error = %e, "Failed to load config");
        e
    })?;

    info!(server = %config.server.name, "Starting amityd");

    // Initialize database
    let db_path = config
        .database
        .as_ref()
        .map(|d| d.path.as_str())
        .unwrap_or("amity.db");
    let db = Database::new(db_path).await?;

    // In-memory registries: owned here, injected into services.
    let presence_registry = Arc::new(PresenceRegistry::new());
    let typing_tracker = Arc::new(TypingTracker::new(Duration::from_secs(
        config.presence.typing_ttl_secs,
    )));
    let delivery = Arc::new(DeliveryHub::new());

    let notifier = Arc::new(Notifier::new(
        db.clone(),
        Arc::clone(&presence_registry),
        delivery.clone(),
    ));

    let request_service = FriendRequestService::new(db.clone());
    let typing_service = Arc::new(TypingService::new(
        Arc::clone(&typing_tracker),
        Arc::clone(&notifier),
    ));

    // Prometheus metrics are optional.
    // Convention: metrics_port = 0 disables the HTTP endpoint (used by tests).
    let metrics_port = config.server.metrics_port.unwrap_or(9090);
    if metrics_port == 0 {
        info!("Metrics disabled");
    } else {
        metrics::init();
        info!("Metrics initialized");

        tokio::spawn(async move {
            http::run_http_server(metrics_port).await;
        });
        info!(port = metrics_port, "Prometheus HTTP server started");
    }

    // Start typing-expiry sweep task
    spawn_typing_sweep_task(
        Arc::clone(&typing_service),
        Duration::from_secs(config.presence.typing_sweep_secs),
    );
    info!(
        period_secs = config.presence.typing_sweep_secs,
        "Typing sweep task started"
    );

    // Start stale-request cleanup task (independent of the typing sweep)
    spawn_request_cleanup_task(request_service, config.cleanup.clone());
    info!(
        period_secs = config.cleanup.interval_secs,
        "Rejected-request cleanup task started"
    );

    // The connection/transport layer registers users with the DeliveryHub
    // and drives the presence and typing services; it runs out-of-process
    // and is not part of this daemon's core.
    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received, exiting");

    Ok(())
}
