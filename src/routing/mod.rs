//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Routing definition file (key=host:port lines)
//!     → parser.rs (parse whole file, reject on first bad line)
//!     → table.rs (atomic wholesale swap of the live mapping)
//!     → resolve(key) against the current snapshot
//! ```
//!
//! # Design Decisions
//! - The mapping is immutable once built; a reload builds a complete new
//!   mapping and swaps it in as one unit (ArcSwap)
//! - Lookups never block on a concurrent reload
//! - A failed reload leaves the previous mapping untouched
//! - Keys are case-insensitive (normalized to lowercase on both sides)

pub mod parser;
pub mod table;

pub use parser::{ConfigError, RouteEntry};
pub use table::RoutingTable;
