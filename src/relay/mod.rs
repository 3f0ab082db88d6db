//! Relay engine subsystem.
//!
//! # Data Flow
//! ```text
//! WebSocket client                      TCP backend
//!     │  receiver half ── pump.rs ──▶ write half   (client→backend)
//!     │  sender half   ◀─ pump.rs ── read half     (backend→client)
//!     │
//!     idle.rs: expiry clock reset by either pump, cancels both on timeout
//! ```
//!
//! # Design Decisions
//! - Two independent pump tasks per session, one shared cancellation token
//! - Teardown barrier: wait for the first pump, cancel the token, await the
//!   second pump before any resource is released
//! - Pump I/O errors are teardown, never application errors; no retries
//! - No buffering beyond one fixed-size read buffer per direction

pub mod idle;
pub mod pump;

use std::sync::Arc;

use axum::extract::ws::WebSocket;
use futures_util::StreamExt;
use tokio::net::TcpStream;
use tokio_util::sync::CancellationToken;

use crate::relay::idle::IdleGuard;

/// Forwarding direction of a pump.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    ClientToBackend,
    BackendToClient,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::ClientToBackend => "client_to_backend",
            Direction::BackendToClient => "backend_to_client",
        }
    }
}

/// Observed state of the client transport, reported to the observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteState {
    Open,
    Closing,
    Closed,
}

impl RemoteState {
    pub fn as_str(&self) -> &'static str {
        match self {
            RemoteState::Open => "open",
            RemoteState::Closing => "closing",
            RemoteState::Closed => "closed",
        }
    }
}

/// Observer hooks invoked by the pumps.
///
/// Implementations are pure observers: they must never block a pump or
/// influence relay behavior.
pub trait RelayObserver: Send + Sync + 'static {
    fn on_activity(&self);
    fn on_bytes(&self, direction: Direction, count: u64);
    fn on_remote_state(&self, state: RemoteState);
}

/// Which pump finished first, used for termination-reason classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FirstFinished {
    Client,
    Backend,
}

/// Run both pumps of a session to completion.
///
/// Spawns one task per direction sharing `token`, waits for the first to
/// finish, cancels the token so the sibling unwinds, then awaits the sibling.
/// Nothing owned by either pump outlives this call.
pub async fn run(
    socket: WebSocket,
    backend: TcpStream,
    token: CancellationToken,
    idle: Arc<IdleGuard>,
    observer: Arc<dyn RelayObserver>,
) -> FirstFinished {
    let (ws_sender, ws_receiver) = socket.split();
    let (tcp_reader, tcp_writer) = backend.into_split();

    let mut client_pump = tokio::spawn(pump::ws_to_tcp(
        ws_receiver,
        tcp_writer,
        token.clone(),
        Arc::clone(&idle),
        Arc::clone(&observer),
    ));
    let mut backend_pump = tokio::spawn(pump::tcp_to_ws(
        tcp_reader,
        ws_sender,
        token.clone(),
        idle,
        observer,
    ));

    let first = tokio::select! {
        _ = &mut client_pump => FirstFinished::Client,
        _ = &mut backend_pump => FirstFinished::Backend,
    };

    token.cancel();

    match first {
        FirstFinished::Client => {
            let _ = backend_pump.await;
        }
        FirstFinished::Backend => {
            let _ = client_pump.await;
        }
    }

    first
}
