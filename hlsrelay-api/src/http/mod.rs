// Module: http
// JSON control API plus HLS output and player assets

pub mod assets;
pub mod error;
pub mod health;
pub mod hls;
pub mod relay;

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use hlsrelay_core::RelayService;
use tower::ServiceBuilder;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

pub use error::{AppError, AppResult};

/// Largest accepted request body (64 KiB)
pub const MAX_BODY_BYTES: usize = 64 * 1024;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub relay: Arc<RelayService>,
    /// Directory holding `index.html` and the player assets
    pub static_dir: Arc<PathBuf>,
}

impl AppState {
    pub fn new(relay: Arc<RelayService>, static_dir: impl Into<PathBuf>) -> Self {
        Self {
            relay,
            static_dir: Arc::new(static_dir.into()),
        }
    }
}

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(health::create_health_router())
        // Control API
        .route(
            "/api/config",
            get(relay::get_config).post(relay::update_config),
        )
        .route("/api/status", get(relay::get_status))
        .route("/api/start", post(relay::start_relay))
        .route("/api/stop", post(relay::stop_relay))
        // Relay output
        .route("/hls/{name}", get(hls::serve_artifact))
        // Player
        .route("/", get(assets::index))
        .route("/static/{file}", get(assets::static_file))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES)),
        )
        .with_state(state)
}
