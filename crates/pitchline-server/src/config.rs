//! Application configuration.
//!
//! Loading flow:
//! 1. Start with compiled [`AppConfig::default()`]
//! 2. If a JSON config file exists, deep-merge its values over the defaults
//! 3. Apply environment variable overrides (highest priority)
//!
//! Deep merge rules: objects merge recursively, arrays and primitives are
//! replaced entirely, nulls in the source are skipped.

use std::path::Path;

use pitchline_auth::AuthConfig;
use pitchline_store::PoolConfig;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

/// Server listener and connection settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind (default `"127.0.0.1"`).
    pub host: String,
    /// Port to bind (default `0` for auto-assign).
    pub port: u16,
    /// Maximum concurrent WebSocket connections.
    pub max_connections: usize,
    /// Heartbeat ping interval in seconds.
    pub heartbeat_interval_secs: u64,
    /// Close the connection after this long without a pong.
    pub heartbeat_timeout_secs: u64,
    /// Max WebSocket message size in bytes.
    pub max_message_size: usize,
    /// Per-connection outbound queue depth.
    pub send_queue_depth: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 0,
            max_connections: 50,
            heartbeat_interval_secs: 30,
            heartbeat_timeout_secs: 90,
            max_message_size: 64 * 1024,
            send_queue_depth: 64,
        }
    }
}

/// Database location and pool settings.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the `SQLite` file; `None` selects an in-memory database.
    pub path: Option<String>,
    /// Connection pool settings.
    #[serde(default)]
    pub pool: PoolConfig,
}

/// Complete application configuration.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Listener and connection settings.
    pub server: ServerConfig,
    /// Token service settings (signing secret, lifetimes).
    pub auth: AuthConfig,
    /// Database settings.
    pub database: DatabaseConfig,
}

impl AppConfig {
    /// Load configuration from an optional JSON file plus process
    /// environment overrides.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load_file(path)?;
        config.apply_env_overrides(|name| std::env::var(name).ok());
        Ok(config)
    }

    /// Load the file-merged configuration without environment overrides.
    pub fn load_file(path: &Path) -> Result<Self, ConfigError> {
        let defaults = serde_json::to_value(Self::default())?;
        let merged = if path.exists() {
            debug!(?path, "loading configuration file");
            let content = std::fs::read_to_string(path)?;
            let user: Value = serde_json::from_str(&content)?;
            deep_merge(defaults, user)
        } else {
            debug!(?path, "configuration file not found, using defaults");
            defaults
        };
        Ok(serde_json::from_value(merged)?)
    }

    /// Apply environment variable overrides through a lookup function.
    ///
    /// Invalid values are ignored, falling back to file/default values.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(v) = lookup("PITCHLINE_HOST") {
            self.server.host = v;
        }
        if let Some(v) = lookup("PITCHLINE_PORT").and_then(|v| v.parse().ok()) {
            self.server.port = v;
        }
        if let Some(v) = lookup("PITCHLINE_MAX_CONNECTIONS").and_then(|v| v.parse().ok()) {
            self.server.max_connections = v;
        }
        if let Some(v) = lookup("PITCHLINE_SECRET") {
            self.auth.secret = v;
        }
        if let Some(v) = lookup("PITCHLINE_ACCESS_TTL_SECS").and_then(|v| v.parse().ok()) {
            self.auth.access_ttl_secs = v;
        }
        if let Some(v) = lookup("PITCHLINE_DB_PATH") {
            self.database.path = Some(v);
        }
    }
}

/// Configuration loading errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File I/O failed.
    #[error("config I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The file was not valid JSON for the config shape.
    #[error("config parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Recursive deep merge of two JSON values.
fn deep_merge(target: Value, source: Value) -> Value {
    match (target, source) {
        (Value::Object(mut target_map), Value::Object(source_map)) => {
            for (key, source_val) in source_map {
                if source_val.is_null() {
                    continue;
                }
                let merged = if let Some(target_val) = target_map.remove(&key) {
                    deep_merge(target_val, source_val)
                } else {
                    source_val
                };
                let _ = target_map.insert(key, merged);
            }
            Value::Object(target_map)
        }
        (_, source) => source,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
