//! Routing definition parsing.
//!
//! # Responsibilities
//! - Parse the line-oriented `key=host:port` definition format
//! - Reject the entire definition on any malformed line
//! - Normalize keys to lowercase for case-insensitive lookup
//!
//! # Design Decisions
//! - Whole-file validation before any entry is accepted (no partial loads)
//! - Duplicate keys: last occurrence wins, matching the loader this format
//!   was inherited from
//! - `#`-prefixed lines and blank lines are ignored

use std::collections::HashMap;

/// A resolved backend endpoint for a routing key.
///
/// Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteEntry {
    pub host: String,
    pub port: u16,
}

impl std::fmt::Display for RouteEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Error type for routing definition loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid definition line {line_no}: '{line}'")]
    MalformedLine { line_no: usize, line: String },

    #[error("invalid host:port value for key '{key}'")]
    InvalidAddress { key: String },

    #[error("invalid port for key '{key}': '{value}'")]
    InvalidPort { key: String, value: String },
}

/// Parse a complete routing definition.
///
/// Returns the full mapping or the first error encountered; callers must not
/// apply anything from a failed parse.
pub fn parse(source: &str) -> Result<HashMap<String, RouteEntry>, ConfigError> {
    let mut map = HashMap::new();

    for (idx, raw_line) in source.lines().enumerate() {
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let (key, address) = line.split_once('=').ok_or_else(|| ConfigError::MalformedLine {
            line_no: idx + 1,
            line: line.to_string(),
        })?;

        let key = key.trim();
        if key.is_empty() {
            return Err(ConfigError::MalformedLine {
                line_no: idx + 1,
                line: line.to_string(),
            });
        }

        let (host, port) = address
            .trim()
            .split_once(':')
            .ok_or_else(|| ConfigError::InvalidAddress { key: key.to_string() })?;

        let host = host.trim();
        let port_str = port.trim();
        if host.is_empty() {
            return Err(ConfigError::InvalidAddress { key: key.to_string() });
        }

        // u16 bounds already exclude > 65535; zero is rejected explicitly.
        let port: u16 = port_str.parse().ok().filter(|p| *p != 0).ok_or_else(|| {
            ConfigError::InvalidPort {
                key: key.to_string(),
                value: port_str.to_string(),
            }
        })?;

        map.insert(
            key.to_lowercase(),
            RouteEntry {
                host: host.to_string(),
                port,
            },
        );
    }

    Ok(map)
}
