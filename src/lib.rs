//! WebSocket-to-TCP Bridge Library

pub mod admin;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod relay;
pub mod routing;
pub mod session;

pub use config::BridgeConfig;
pub use http::BridgeServer;
pub use lifecycle::Shutdown;
pub use routing::RoutingTable;
pub use session::ConnectionRegistry;
