//! Lifecycle management subsystem.
//!
//! # Design Decisions
//! - One broadcast channel fans the shutdown signal out to the server's
//!   graceful-shutdown future and any interested tasks
//! - Tests trigger shutdown directly; production wires it to ctrl-c

pub mod shutdown;

pub use shutdown::Shutdown;
