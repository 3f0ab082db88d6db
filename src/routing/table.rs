//! The live routing table.
//!
//! # Responsibilities
//! - Hold the current key → backend mapping as an immutable snapshot
//! - Resolve keys without blocking concurrent reloads
//! - Reload the mapping atomically from the definition file
//!
//! # Design Decisions
//! - `ArcSwap` holds the snapshot: readers load once per lookup and never
//!   contend with a writer
//! - Initial-load failure is a warning and the table stays empty; the
//!   process still starts (every lookup simply misses)
//! - Manual reload failure is an error and keeps the current mapping

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::routing::parser::{self, ConfigError, RouteEntry};

/// Mapping from routing key to backend endpoint, atomically reloadable.
pub struct RoutingTable {
    path: PathBuf,
    map: ArcSwap<HashMap<String, RouteEntry>>,
}

impl RoutingTable {
    /// Create an empty table bound to a definition file.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            map: ArcSwap::from_pointee(HashMap::new()),
        }
    }

    /// Path of the definition file this table reloads from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Case-insensitive lookup against the current snapshot.
    pub fn resolve(&self, key: &str) -> Option<RouteEntry> {
        self.map.load().get(&key.to_lowercase()).cloned()
    }

    /// Number of entries in the current snapshot.
    pub fn entry_count(&self) -> usize {
        self.map.load().len()
    }

    /// Re-read the definition file and swap in the new mapping.
    ///
    /// The swap happens only after the whole file parsed cleanly; on any
    /// error the live mapping is untouched. Returns the new entry count.
    pub fn reload(&self) -> Result<usize, ConfigError> {
        let source = fs::read_to_string(&self.path)?;
        let map = parser::parse(&source)?;
        let count = map.len();
        self.map.store(Arc::new(map));
        Ok(count)
    }

    /// Initial load at startup. Failure is non-fatal: the table stays empty
    /// and every lookup misses until a later reload succeeds.
    pub fn load_initial(&self) {
        match self.reload() {
            Ok(count) => {
                tracing::info!(
                    path = %self.path.display(),
                    entries = count,
                    "Routing definition loaded"
                );
            }
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Initial routing load failed; starting with an empty table"
                );
            }
        }
    }
}
