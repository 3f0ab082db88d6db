//! HTTP/WebSocket server subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, connect info, trace layer)
//!     → ws path  → session orchestrator (upgrade + relay)
//!     → /reload, /sessions, /healthz → admin handlers
//! ```

pub mod server;

pub use server::{AppState, BridgeServer};
