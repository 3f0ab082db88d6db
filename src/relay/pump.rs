//! Directional byte pumps.
//!
//! # Responsibilities
//! - client→backend: forward WebSocket message payloads verbatim to the TCP
//!   write half; half-close the backend when the client is done
//! - backend→client: forward TCP reads as single binary messages; initiate
//!   the close handshake on the way out while the client is still open
//!
//! # Design Decisions
//! - Every blocking call sits inside a `select!` against the shared token,
//!   so cancellation unblocks promptly and is never an error
//! - Exactly one failed read/write ends a direction; teardown errors are
//!   swallowed
//! - Order is preserved within a direction; payload boundaries on the TCP
//!   side follow read sizes, not the backend's write sizes

use std::sync::Arc;

use axum::extract::ws::{close_code, CloseFrame, Message, Utf8Bytes, WebSocket};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio_util::sync::CancellationToken;

use crate::relay::idle::IdleGuard;
use crate::relay::{Direction, RelayObserver, RemoteState};

/// Read size for the backend stream.
pub const BACKEND_READ_BUF: usize = 8 * 1024;

/// Close reason sent to the client when the backend hangs up.
pub const BACKEND_CLOSED_REASON: &str = "backend closed";

/// Client→backend pump. Ends on close frame, client error, or cancellation;
/// always half-closes the backend write side on the way out.
pub(super) async fn ws_to_tcp(
    mut receiver: SplitStream<WebSocket>,
    mut backend: OwnedWriteHalf,
    token: CancellationToken,
    idle: Arc<IdleGuard>,
    observer: Arc<dyn RelayObserver>,
) {
    loop {
        let received = tokio::select! {
            _ = token.cancelled() => break,
            msg = receiver.next() => msg,
        };

        let message = match received {
            Some(Ok(message)) => message,
            // Stream end or transport error: the client is gone.
            _ => {
                observer.on_remote_state(RemoteState::Closed);
                break;
            }
        };

        let payload: &[u8] = match &message {
            Message::Close(_) => {
                observer.on_remote_state(RemoteState::Closed);
                break;
            }
            Message::Text(text) => text.as_str().as_bytes(),
            Message::Binary(bytes) => bytes,
            // Ping/pong are answered by the transport layer.
            _ => continue,
        };

        idle.touch();
        observer.on_activity();
        observer.on_bytes(Direction::ClientToBackend, payload.len() as u64);

        // The write must unblock on cancellation too: a backend that stops
        // draining would otherwise park this pump past idle expiry.
        let written = tokio::select! {
            _ = token.cancelled() => break,
            r = backend.write_all(payload) => r,
        };
        if written.is_err() {
            break;
        }
    }

    // Orderly half-close so the backend observes EOF on its read side.
    let _ = backend.shutdown().await;
}

/// Backend→client pump. Ends on backend EOF, read error, client send
/// failure, or cancellation; on every exit with the client still open it
/// initiates (without awaiting) the client close handshake.
pub(super) async fn tcp_to_ws(
    mut backend: OwnedReadHalf,
    mut sender: SplitSink<WebSocket, Message>,
    token: CancellationToken,
    idle: Arc<IdleGuard>,
    observer: Arc<dyn RelayObserver>,
) {
    let mut buf = vec![0u8; BACKEND_READ_BUF];
    let mut client_gone = false;

    loop {
        let read = tokio::select! {
            _ = token.cancelled() => break,
            r = backend.read(&mut buf) => r,
        };

        let n = match read {
            Ok(0) => break,
            Ok(n) => n,
            Err(_) => break,
        };

        idle.touch();
        observer.on_activity();
        observer.on_bytes(Direction::BackendToClient, n as u64);

        // A client that stops reading must not wedge this pump: the send is
        // raced against the same cancellation signal as the read.
        let sent = tokio::select! {
            _ = token.cancelled() => break,
            r = sender.send(Message::Binary(buf[..n].to_vec().into())) => r,
        };
        if sent.is_err() {
            observer.on_remote_state(RemoteState::Closed);
            client_gone = true;
            break;
        }
    }

    if !client_gone {
        observer.on_remote_state(RemoteState::Closing);
        let _ = sender
            .send(Message::Close(Some(CloseFrame {
                code: close_code::NORMAL,
                reason: Utf8Bytes::from_static(BACKEND_CLOSED_REASON),
            })))
            .await;
    }
}
