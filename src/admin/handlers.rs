use std::collections::HashMap;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::http::server::AppState;
use crate::session::SessionSnapshot;

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
}

#[derive(Serialize)]
pub struct ReloadResult {
    pub status: &'static str,
    pub path: String,
    pub entries: usize,
}

#[derive(Serialize)]
pub struct SessionList {
    pub total: usize,
    pub sessions: Vec<SessionSnapshot>,
}

pub async fn get_health() -> Json<SystemStatus> {
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
    })
}

pub async fn get_sessions(State(state): State<AppState>) -> Json<SessionList> {
    let sessions = state.registry.snapshot();
    Json(SessionList {
        total: sessions.len(),
        sessions,
    })
}

/// Re-read the routing definition. Idempotent; a failed reload keeps the
/// current mapping and reports a generic error (detail goes to the log only).
pub async fn reload_routes(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    if let Some(expected) = &state.config.reload_key {
        match params.get("key") {
            Some(supplied) if supplied == expected => {}
            _ => {
                tracing::warn!("Reload rejected: missing or invalid key");
                return (StatusCode::UNAUTHORIZED, "invalid reload key").into_response();
            }
        }
    }

    let path = state.table.path().display().to_string();
    match state.table.reload() {
        Ok(entries) => {
            tracing::info!(path = %path, entries, "Routing definition reloaded via admin endpoint");
            Json(ReloadResult {
                status: "ok",
                path,
                entries,
            })
            .into_response()
        }
        Err(e) => {
            tracing::error!(path = %path, error = %e, "Manual reload failed; keeping current mapping");
            (StatusCode::INTERNAL_SERVER_ERROR, "reload failed").into_response()
        }
    }
}
