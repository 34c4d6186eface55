//! Configuration loading and management.

use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Daemon configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Server information.
    pub server: ServerConfig,
    /// Database configuration.
    pub database: Option<DatabaseConfig>,
    /// Presence and typing-indicator tuning.
    #[serde(default)]
    pub presence: PresenceConfig,
    /// Stale friend-request cleanup tuning.
    #[serde(default)]
    pub cleanup: CleanupConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}

/// Server identity configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Server name (e.g., "amity.straylight.net").
    pub name: String,
    /// Prometheus metrics HTTP port (default: 9090; 0 disables).
    pub metrics_port: Option<u16>,
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file, or ":memory:".
    pub path: String,
}

/// Presence and typing-indicator configuration.
///
/// The typing TTL bounds how long a typing indicator stays alive without a
/// refresh; the sweep interval is how often expired entries are collected
/// and their ACTIVE=false events emitted.
#[derive(Debug, Clone, Deserialize)]
pub struct PresenceConfig {
    /// Seconds a typing indicator lives without a refresh (default: 5).
    #[serde(default = "default_typing_ttl")]
    pub typing_ttl_secs: u64,

    /// Seconds between typing-expiry sweeps (default: 3).
    #[serde(default = "default_typing_sweep")]
    pub typing_sweep_secs: u64,
}

impl Default for PresenceConfig {
    fn default() -> Self {
        Self {
            typing_ttl_secs: default_typing_ttl(),
            typing_sweep_secs: default_typing_sweep(),
        }
    }
}

fn default_typing_ttl() -> u64 {
    5
}

fn default_typing_sweep() -> u64 {
    3
}

/// Stale friend-request cleanup configuration.
///
/// Runs on a much longer period than the typing sweep and is isolated from
/// it; REJECTED requests older than the cutoff are batch-deleted.
#[derive(Debug, Clone, Deserialize)]
pub struct CleanupConfig {
    /// Age in days after which REJECTED requests are deleted (default: 30).
    #[serde(default = "default_rejected_max_age_days")]
    pub rejected_max_age_days: i64,

    /// Seconds between cleanup runs (default: 86400).
    #[serde(default = "default_cleanup_interval")]
    pub interval_secs: u64,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            rejected_max_age_days: default_rejected_max_age_days(),
            interval_secs: default_cleanup_interval(),
        }
    }
}

fn default_rejected_max_age_days() -> i64 {
    30
}

fn default_cleanup_interval() -> u64 {
    86400
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config() {
        let config: Config = toml::from_str(
            r#"
            [server]
            name = "test.server"
            "#,
        )
        .expect("minimal config should parse");

        assert_eq!(config.server.name, "test.server");
        assert!(config.database.is_none());
        assert_eq!(config.presence.typing_ttl_secs, 5);
        assert_eq!(config.presence.typing_sweep_secs, 3);
        assert_eq!(config.cleanup.rejected_max_age_days, 30);
        assert_eq!(config.cleanup.interval_secs, 86400);
    }

    #[test]
    fn test_full_config() {
        let config: Config = toml::from_str(
            r#"
            [server]
            name = "amity.example.net"
            metrics_port = 9100

            [database]
            path = "/var/lib/amityd/amity.db"

            [presence]
            typing_ttl_secs = 10
            typing_sweep_secs = 2

            [cleanup]
            rejected_max_age_days = 7
            interval_secs = 3600
            "#,
        )
        .expect("full config should parse");

        assert_eq!(config.server.metrics_port, Some(9100));
        assert_eq!(
            config.database.as_ref().map(|d| d.path.as_str()),
            Some("/var/lib/amityd/amity.db")
        );
        assert_eq!(config.presence.typing_ttl_secs, 10);
        assert_eq!(config.cleanup.rejected_max_age_days, 7);
    }
}
