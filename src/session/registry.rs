//! Connection registry.
//!
//! # Responsibilities
//! - Track every live session for the admin snapshot endpoint
//! - Absorb activity/byte/state notifications from the pumps
//!
//! # Design Decisions
//! - Pure observer: nothing here can affect relay behavior or block a pump
//! - Concurrently-updated fields are atomics with last-write-wins stores;
//!   no read-modify-write contract is needed for timestamps
//! - Snapshot is sorted by creation time and includes the seconds since the
//!   last observed activity

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use dashmap::DashMap;
use serde::Serialize;
use uuid::Uuid;

use crate::relay::{Direction, RelayObserver, RemoteState};
use crate::routing::RouteEntry;

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// Live state for one relay session.
struct ActiveSession {
    route_key: String,
    backend_host: String,
    backend_port: u16,
    client_addr: String,
    created_at_ms: u64,
    idle_timeout_secs: u64,
    last_activity_ms: AtomicU64,
    client_bytes: AtomicU64,
    backend_bytes: AtomicU64,
    remote_state: AtomicU8,
}

fn state_to_u8(state: RemoteState) -> u8 {
    match state {
        RemoteState::Open => 0,
        RemoteState::Closing => 1,
        RemoteState::Closed => 2,
    }
}

fn state_from_u8(raw: u8) -> RemoteState {
    match raw {
        1 => RemoteState::Closing,
        2 => RemoteState::Closed,
        _ => RemoteState::Open,
    }
}

/// Serialized view of one session for the snapshot endpoint.
#[derive(Debug, Serialize)]
pub struct SessionSnapshot {
    pub id: Uuid,
    pub route_key: String,
    pub backend_host: String,
    pub backend_port: u16,
    pub client_addr: String,
    pub created_at_ms: u64,
    pub last_activity_ms: u64,
    pub idle_timeout_secs: u64,
    pub seconds_since_last_activity: f64,
    pub client_bytes: u64,
    pub backend_bytes: u64,
    pub remote_state: &'static str,
}

/// Registry of all live sessions.
#[derive(Default)]
pub struct ConnectionRegistry {
    sessions: DashMap<Uuid, ActiveSession>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a freshly connected session.
    pub fn register(
        &self,
        id: Uuid,
        route_key: &str,
        backend: &RouteEntry,
        client_addr: SocketAddr,
        idle_timeout: Duration,
    ) {
        let now = now_millis();
        self.sessions.insert(
            id,
            ActiveSession {
                route_key: route_key.to_string(),
                backend_host: backend.host.clone(),
                backend_port: backend.port,
                client_addr: client_addr.to_string(),
                created_at_ms: now,
                idle_timeout_secs: idle_timeout.as_secs(),
                last_activity_ms: AtomicU64::new(now),
                client_bytes: AtomicU64::new(0),
                backend_bytes: AtomicU64::new(0),
                remote_state: AtomicU8::new(state_to_u8(RemoteState::Open)),
            },
        );
    }

    /// Update the activity timestamp. Last write wins.
    pub fn touch(&self, id: Uuid) {
        if let Some(session) = self.sessions.get(&id) {
            session.last_activity_ms.store(now_millis(), Ordering::Relaxed);
        }
    }

    /// Accumulate forwarded bytes for one direction.
    pub fn add_bytes(&self, id: Uuid, direction: Direction, count: u64) {
        if let Some(session) = self.sessions.get(&id) {
            let counter = match direction {
                Direction::ClientToBackend => &session.client_bytes,
                Direction::BackendToClient => &session.backend_bytes,
            };
            counter.fetch_add(count, Ordering::Relaxed);
        }
    }

    /// Note the observed client transport state.
    pub fn note_remote_state(&self, id: Uuid, state: RemoteState) {
        if let Some(session) = self.sessions.get(&id) {
            session.remote_state.store(state_to_u8(state), Ordering::Relaxed);
        }
    }

    /// Drop a finished session. Idempotent.
    pub fn remove(&self, id: Uuid) {
        self.sessions.remove(&id);
    }

    /// Number of live sessions.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Point-in-time view of every live session, oldest first.
    pub fn snapshot(&self) -> Vec<SessionSnapshot> {
        let now = now_millis();
        let mut snapshots: Vec<SessionSnapshot> = self
            .sessions
            .iter()
            .map(|entry| {
                let s = entry.value();
                let last_activity_ms = s.last_activity_ms.load(Ordering::Relaxed);
                SessionSnapshot {
                    id: *entry.key(),
                    route_key: s.route_key.clone(),
                    backend_host: s.backend_host.clone(),
                    backend_port: s.backend_port,
                    client_addr: s.client_addr.clone(),
                    created_at_ms: s.created_at_ms,
                    last_activity_ms,
                    idle_timeout_secs: s.idle_timeout_secs,
                    seconds_since_last_activity: now.saturating_sub(last_activity_ms) as f64
                        / 1000.0,
                    client_bytes: s.client_bytes.load(Ordering::Relaxed),
                    backend_bytes: s.backend_bytes.load(Ordering::Relaxed),
                    remote_state: state_from_u8(s.remote_state.load(Ordering::Relaxed)).as_str(),
                }
            })
            .collect();
        snapshots.sort_by_key(|s| s.created_at_ms);
        snapshots
    }
}

/// Per-session adapter wiring the pumps' observer hooks to the registry.
pub struct SessionObserver {
    registry: Arc<ConnectionRegistry>,
    id: Uuid,
}

impl SessionObserver {
    pub fn new(registry: Arc<ConnectionRegistry>, id: Uuid) -> Self {
        Self { registry, id }
    }
}

impl RelayObserver for SessionObserver {
    fn on_activity(&self) {
        self.registry.touch(self.id);
    }

    fn on_bytes(&self, direction: Direction, count: u64) {
        self.registry.add_bytes(self.id, direction, count);
    }

    fn on_remote_state(&self, state: RemoteState) {
        self.registry.note_remote_state(self.id, state);
    }
}
