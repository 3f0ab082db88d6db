//! Server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router with the upgrade endpoint and admin routes
//! - Wire up middleware (tracing)
//! - Serve with connect info and graceful shutdown
//!
//! # Design Decisions
//! - No request timeout layer: sessions are long-lived WebSocket relays and
//!   their lifetime is governed by the idle guard instead

use std::net::SocketAddr;
use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::trace::TraceLayer;

use crate::admin;
use crate::config::BridgeConfig;
use crate::routing::RoutingTable;
use crate::session::{self, ConnectionRegistry};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<BridgeConfig>,
    pub table: Arc<RoutingTable>,
    pub registry: Arc<ConnectionRegistry>,
}

/// The bridge's HTTP/WebSocket server.
pub struct BridgeServer {
    router: Router,
}

impl BridgeServer {
    /// Create a server over the given shared state.
    pub fn new(
        config: Arc<BridgeConfig>,
        table: Arc<RoutingTable>,
        registry: Arc<ConnectionRegistry>,
    ) -> Self {
        let ws_path = config.ws_path.clone();
        let state = AppState {
            config,
            table,
            registry,
        };

        let router = Router::new()
            .route(&ws_path, get(session::handle_ws))
            .merge(admin::router())
            .with_state(state)
            .layer(TraceLayer::new_for_http());

        Self { router }
    }

    /// Run the server until the shutdown signal fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "Bridge server starting");

        let app = self
            .router
            .into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("Bridge server stopped");
        Ok(())
    }
}
