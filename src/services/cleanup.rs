//! Stale friend-request cleanup background task.

use crate::config::CleanupConfig;
use crate::services::FriendRequestService;
use std::time::Duration;
use tracing::info;

/// Spawn the periodic cleanup of old REJECTED friend requests.
///
/// Runs once at startup and then on the configured interval. Operates purely
/// on storage; a failed run is logged and retried at the next tick.
pub fn spawn_request_cleanup_task(service: FriendRequestService, config: CleanupConfig) {
    tokio::spawn(async move {
        // Run immediately at startup
        match service.cleanup_old_rejected(config.rejected_max_age_days).await {
            Ok(removed) if removed > 0 => {
                info!(removed = removed, "Startup: old rejected requests removed");
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(error = %e, "Startup: failed to clean up rejected requests");
            }
        }

        let mut interval = tokio::time::interval(Duration::from_secs(config.interval_secs));
        // The first tick fires immediately and would double the startup run.
        interval.tick().await;

        loop {
            interval.tick().await;
            match service.cleanup_old_rejected(config.rejected_max_age_days).await {
                Ok(removed) if removed > 0 => {
                    info!(removed = removed, "Old rejected requests removed");
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to clean up rejected requests");
                }
            }
        }
    });
}
