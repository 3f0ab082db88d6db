//! Session orchestration subsystem.
//!
//! # Data Flow
//! ```text
//! Upgrade request (?Token=key)
//!     → gate: must be a WebSocket upgrade        (400 otherwise)
//!     → gate: routing key present and non-blank  (400 otherwise)
//!     → gate: key resolves in the routing table  (404 otherwise)
//!     → accept upgrade → dial backend (bounded)  (policy close on failure)
//!     → register session, start idle guard, run the relay engine
//!     → classify termination, finalize exactly once
//! ```
//!
//! # Design Decisions
//! - No session record exists before a successful backend dial
//! - The idle clock starts only after the dial succeeds; the dial itself is
//!   bounded by its own connect timeout
//! - Termination reasons: idle timeout beats client closed beats backend
//!   closed, in that order of precedence

pub mod registry;

pub use registry::{ConnectionRegistry, SessionObserver, SessionSnapshot};

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::ws::rejection::WebSocketUpgradeRejection;
use axum::extract::ws::{close_code, CloseFrame, Message, Utf8Bytes, WebSocket, WebSocketUpgrade};
use axum::extract::{ConnectInfo, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tokio::net::TcpStream;
use uuid::Uuid;

use crate::http::server::AppState;
use crate::relay::idle::IdleGuard;
use crate::relay::{self, FirstFinished, RelayObserver};
use crate::routing::RouteEntry;

/// Close reason sent when the backend cannot be dialed.
pub const BACKEND_UNAVAILABLE_REASON: &str = "backend unavailable";

/// Why a session ended. Every session gets exactly one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationReason {
    IdleTimeout,
    ClientClosed,
    BackendClosed,
}

impl std::fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TerminationReason::IdleTimeout => "idle timeout",
            TerminationReason::ClientClosed => "client closed",
            TerminationReason::BackendClosed => "backend closed",
        };
        f.write_str(s)
    }
}

fn classify(idle_expired: bool, first: FirstFinished) -> TerminationReason {
    if idle_expired {
        TerminationReason::IdleTimeout
    } else {
        match first {
            FirstFinished::Client => TerminationReason::ClientClosed,
            FirstFinished::Backend => TerminationReason::BackendClosed,
        }
    }
}

/// Pull the routing key out of the query pairs, matching the configured
/// parameter name case-insensitively.
fn route_key(params: &HashMap<String, String>, param_name: &str) -> Option<String> {
    params
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(param_name))
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Upgrade endpoint handler: runs the pre-accept gates, then hands the
/// accepted socket to [`run_session`].
pub async fn handle_ws(
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
    Query(params): Query<HashMap<String, String>>,
    ConnectInfo(client_addr): ConnectInfo<SocketAddr>,
    State(state): State<AppState>,
) -> Response {
    let ws = match ws {
        Ok(ws) => ws,
        Err(_) => {
            return (StatusCode::BAD_REQUEST, "WebSocket requests only").into_response();
        }
    };

    let Some(key) = route_key(&params, &state.config.token_param) else {
        tracing::debug!(client = %client_addr, "Upgrade rejected: missing routing key");
        return (
            StatusCode::BAD_REQUEST,
            format!("Missing '{}' query parameter", state.config.token_param),
        )
            .into_response();
    };

    let Some(entry) = state.table.resolve(&key) else {
        tracing::debug!(client = %client_addr, key = %key, "Upgrade rejected: unknown routing key");
        return (StatusCode::NOT_FOUND, "No backend for supplied key").into_response();
    };

    ws.on_upgrade(move |socket| run_session(socket, state, key, entry, client_addr))
}

/// Drive one accepted client connection from backend dial to full teardown.
async fn run_session(
    mut socket: WebSocket,
    state: AppState,
    key: String,
    entry: RouteEntry,
    client_addr: SocketAddr,
) {
    // Dial phase: bounded attempt, idle clock not yet running.
    let dial = tokio::time::timeout(
        state.config.connect_timeout(),
        TcpStream::connect((entry.host.as_str(), entry.port)),
    );
    let backend = match dial.await {
        Ok(Ok(stream)) => stream,
        Ok(Err(e)) => {
            tracing::warn!(
                key = %key,
                backend = %entry,
                error = %e,
                "Failed to connect to backend"
            );
            close_with_policy_error(&mut socket).await;
            return;
        }
        Err(_) => {
            tracing::warn!(key = %key, backend = %entry, "Backend connect timed out");
            close_with_policy_error(&mut socket).await;
            return;
        }
    };

    let id = Uuid::new_v4();
    let idle_timeout = state.config.idle_timeout();
    state
        .registry
        .register(id, &key, &entry, client_addr, idle_timeout);
    tracing::info!(
        session_id = %id,
        key = %key,
        backend = %entry,
        client = %client_addr,
        "Session started"
    );

    let idle = Arc::new(IdleGuard::new(idle_timeout));
    let relay_token = idle.token().child_token();
    let observer: Arc<dyn RelayObserver> =
        Arc::new(SessionObserver::new(Arc::clone(&state.registry), id));

    let first = relay::run(socket, backend, relay_token, Arc::clone(&idle), observer).await;

    let reason = classify(idle.is_expired(), first);
    idle.dispose();

    tracing::info!(
        session_id = %id,
        key = %key,
        backend = %entry,
        reason = %reason,
        "Session ended"
    );
    state.registry.remove(id);
}

/// Close the already-accepted socket after a dial failure. The handshake is
/// done, so a close frame with a policy code is all we can send.
async fn close_with_policy_error(socket: &mut WebSocket) {
    let _ = socket
        .send(Message::Close(Some(CloseFrame {
            code: close_code::POLICY,
            reason: Utf8Bytes::from_static(BACKEND_UNAVAILABLE_REASON),
        })))
        .await;
}
