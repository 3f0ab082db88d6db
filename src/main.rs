//! WebSocket-to-TCP Bridge
//!
//! Accepts WebSocket connections carrying a routing key, resolves the key
//! against a hot-reloadable routing table, and relays raw bytes between the
//! client and the selected TCP backend until one side closes or the session
//! goes idle.
//!
//! ```text
//! Client ── WebSocket frames ──▶ bridge ── raw bytes ──▶ TCP backend
//!        ◀── binary messages ──        ◀── stream reads ──
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ws_bridge::config::BridgeConfig;
use ws_bridge::http::BridgeServer;
use ws_bridge::lifecycle::Shutdown;
use ws_bridge::routing::RoutingTable;
use ws_bridge::session::ConnectionRegistry;

#[derive(Parser)]
#[command(name = "ws-bridge")]
#[command(about = "WebSocket-to-TCP relay bridge", long_about = None)]
struct Cli {
    /// Routing definition file (also honors CONFIG_PATH env var)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Bind address
    #[arg(short, long, default_value = "0.0.0.0:8080")]
    bind: String,

    /// WebSocket upgrade path
    #[arg(long, default_value = "/ws")]
    ws_path: String,

    /// Query parameter carrying the routing key
    #[arg(long, default_value = "Token")]
    token_param: String,

    /// Idle timeout per session, seconds
    #[arg(long, default_value_t = 60)]
    idle_timeout: u64,

    /// Backend connect timeout, seconds
    #[arg(long, default_value_t = 10)]
    connect_timeout: u64,

    /// Shared secret required by the reload endpoint
    #[arg(long)]
    reload_key: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ws_bridge=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = Arc::new(BridgeConfig {
        bind_address: cli.bind,
        ws_path: cli.ws_path,
        token_param: cli.token_param,
        routes_file: BridgeConfig::resolve_routes_file(cli.config),
        idle_timeout_secs: cli.idle_timeout,
        connect_timeout_secs: cli.connect_timeout,
        reload_key: cli.reload_key,
    });

    tracing::info!(
        bind_address = %config.bind_address,
        ws_path = %config.ws_path,
        routes_file = %config.routes_file.display(),
        idle_timeout_secs = config.idle_timeout_secs,
        "Configuration loaded"
    );

    let table = Arc::new(RoutingTable::new(&config.routes_file));
    table.load_initial();

    let registry = Arc::new(ConnectionRegistry::new());

    let listener = TcpListener::bind(&config.bind_address).await?;
    let local_addr = listener.local_addr()?;
    tracing::info!(address = %local_addr, "Listening for connections");

    let shutdown = Shutdown::new();
    shutdown.trigger_on_ctrl_c();

    let server = BridgeServer::new(config, table, registry);
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
