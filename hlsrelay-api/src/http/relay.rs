//! Relay control endpoints
//!
//! GET  /api/config  persisted config plus live status
//! POST /api/config  validate, persist and restart
//! GET  /api/status  live status
//! POST /api/start   restart with the persisted config
//! POST /api/stop    stop the relay

use axum::{body::Bytes, extract::State, Json};
use hlsrelay_core::{RelayConfig, RelayStatus};
use serde_json::{json, Value};
use tracing::info;

use crate::http::{AppResult, AppState};

pub async fn get_config(State(state): State<AppState>) -> AppResult<Json<Value>> {
    let config = state.relay.config().await?;
    let status = state.relay.status().await;
    Ok(Json(json!({ "config": config, "status": status })))
}

/// The body is parsed by hand so malformed JSON gets the same error shape as
/// every other failure. An empty body means "all defaults".
pub async fn update_config(State(state): State<AppState>, body: Bytes) -> AppResult<Json<Value>> {
    let raw: &[u8] = if body.iter().all(u8::is_ascii_whitespace) {
        b"{}"
    } else {
        &body
    };
    let cfg: RelayConfig = serde_json::from_slice(raw)?;
    let applied = state.relay.apply(cfg).await?;
    info!("Relay configuration updated");
    Ok(Json(json!({ "status": "saved_and_restarted", "config": applied })))
}

pub async fn get_status(State(state): State<AppState>) -> Json<RelayStatus> {
    Json(state.relay.status().await)
}

pub async fn start_relay(State(state): State<AppState>) -> AppResult<Json<Value>> {
    state.relay.start_persisted().await?;
    Ok(Json(json!({ "status": "started" })))
}

pub async fn stop_relay(State(state): State<AppState>) -> Json<Value> {
    state.relay.stop().await;
    Json(json!({ "status": "stopped" }))
}
