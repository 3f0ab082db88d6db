//! Shared utilities for integration testing.
#![allow(dead_code)]

use std::io::Write;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use ws_bridge::config::BridgeConfig;
use ws_bridge::http::BridgeServer;
use ws_bridge::lifecycle::Shutdown;
use ws_bridge::routing::RoutingTable;
use ws_bridge::session::ConnectionRegistry;

pub type WsClient = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// A bridge instance bound to an ephemeral port, plus handles for
/// assertions and teardown.
pub struct TestBridge {
    pub addr: SocketAddr,
    pub registry: Arc<ConnectionRegistry>,
    pub table: Arc<RoutingTable>,
    pub shutdown: Shutdown,
}

impl TestBridge {
    pub fn ws_url(&self, key: &str) -> String {
        format!("ws://{}/ws?Token={}", self.addr, key)
    }

    pub fn http_url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

/// Spawn a bridge server with the given options.
pub async fn start_bridge(mut config: BridgeConfig) -> TestBridge {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    config.bind_address = addr.to_string();

    let table = Arc::new(RoutingTable::new(&config.routes_file));
    table.load_initial();
    let registry = Arc::new(ConnectionRegistry::new());

    let shutdown = Shutdown::new();
    let server = BridgeServer::new(Arc::new(config), Arc::clone(&table), Arc::clone(&registry));
    let rx = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, rx).await;
    });

    TestBridge {
        addr,
        registry,
        table,
        shutdown,
    }
}

/// Write a routing definition to a temp file that lives as long as the
/// returned handle.
pub fn write_routes(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

/// Replace the contents of an existing routing definition file.
pub fn rewrite_routes(file: &mut tempfile::NamedTempFile, content: &str) {
    file.as_file_mut().set_len(0).unwrap();
    use std::io::Seek;
    file.as_file_mut().rewind().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
}

/// Connect a WebSocket test client for the given routing key.
pub async fn connect_ws(bridge: &TestBridge, key: &str) -> WsClient {
    let (ws, _) = connect_async(bridge.ws_url(key)).await.unwrap();
    ws
}

/// TCP backend that echoes every byte it receives.
pub async fn start_echo_backend() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    tokio::spawn(async move {
                        let mut buf = vec![0u8; 4096];
                        loop {
                            match socket.read(&mut buf).await {
                                Ok(0) | Err(_) => break,
                                Ok(n) => {
                                    if socket.write_all(&buf[..n]).await.is_err() {
                                        break;
                                    }
                                }
                            }
                        }
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

/// TCP backend that sends a greeting on accept, then forwards everything it
/// reads to the returned channel.
pub async fn start_greeting_backend(
    greeting: &'static [u8],
) -> (SocketAddr, mpsc::UnboundedReceiver<Vec<u8>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let tx = tx.clone();
                    tokio::spawn(async move {
                        if socket.write_all(greeting).await.is_err() {
                            return;
                        }
                        let mut buf = vec![0u8; 4096];
                        loop {
                            match socket.read(&mut buf).await {
                                Ok(0) | Err(_) => break,
                                Ok(n) => {
                                    let _ = tx.send(buf[..n].to_vec());
                                }
                            }
                        }
                    });
                }
                Err(_) => break,
            }
        }
    });

    (addr, rx)
}

/// TCP backend that sends a payload and immediately closes.
pub async fn start_send_then_close_backend(payload: &'static [u8]) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    tokio::spawn(async move {
                        let _ = socket.write_all(payload).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

/// TCP backend that accepts connections but never reads or writes, so the
/// bridge's backend-facing send buffer eventually fills.
pub async fn start_blackhole_backend() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((socket, _)) => {
                    tokio::spawn(async move {
                        let _socket = socket;
                        std::future::pending::<()>().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

/// Reserve a port with nothing listening on it.
pub async fn dead_port() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

/// Poll `condition` until it holds or the timeout elapses.
pub async fn wait_until(timeout: Duration, condition: impl Fn() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
    condition()
}

/// Bridge options pointing at the given routing definition, with fast
/// timeouts suitable for tests.
pub fn test_config(routes_file: &tempfile::NamedTempFile) -> BridgeConfig {
    BridgeConfig {
        routes_file: routes_file.path().to_path_buf(),
        idle_timeout_secs: 30,
        connect_timeout_secs: 2,
        ..BridgeConfig::default()
    }
}
