//! Administrative endpoints.
//!
//! # Responsibilities
//! - `/reload`: re-read the routing definition, gated by the shared secret
//! - `/sessions`: snapshot of all live sessions
//! - `/healthz`: liveness/status probe

pub mod handlers;

use axum::routing::get;
use axum::Router;

use crate::http::server::AppState;
use self::handlers::{get_health, get_sessions, reload_routes};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/reload", get(reload_routes))
        .route("/sessions", get(get_sessions))
        .route("/healthz", get(get_health))
}
