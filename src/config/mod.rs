//! Configuration subsystem.
//!
//! # Design Decisions
//! - Runtime options come from CLI flags with sensible defaults; the routing
//!   definition path additionally honors the `CONFIG_PATH` environment
//!   variable (flag wins when both are present)
//! - The routing definition itself is NOT here: it is a separately reloadable
//!   artifact owned by the routing subsystem

pub mod schema;

pub use schema::BridgeConfig;
