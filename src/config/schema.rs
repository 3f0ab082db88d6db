//! Runtime option definitions.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Runtime options for the bridge.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Path serving the WebSocket upgrade endpoint.
    pub ws_path: String,

    /// Query parameter carrying the routing key (matched case-insensitively).
    pub token_param: String,

    /// Routing definition file (`key=host:port` lines).
    pub routes_file: PathBuf,

    /// Idle timeout per session, in seconds.
    pub idle_timeout_secs: u64,

    /// Backend connect timeout, in seconds.
    pub connect_timeout_secs: u64,

    /// Shared secret gating the reload endpoint; None disables the check.
    pub reload_key: Option<String>,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            ws_path: "/ws".to_string(),
            token_param: "Token".to_string(),
            routes_file: PathBuf::from("backend.config"),
            idle_timeout_secs: 60,
            connect_timeout_secs: 10,
            reload_key: None,
        }
    }
}

impl BridgeConfig {
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Routing definition path honoring the `CONFIG_PATH` env fallback when
    /// the configured value is still the default.
    pub fn resolve_routes_file(explicit: Option<PathBuf>) -> PathBuf {
        if let Some(path) = explicit {
            return path;
        }
        if let Ok(from_env) = std::env::var("CONFIG_PATH") {
            if !from_env.trim().is_empty() {
                return PathBuf::from(from_env);
            }
        }
        PathBuf::from("backend.config")
    }
}
