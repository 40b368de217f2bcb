// HTTP surface of the relay: control API, HLS output and the bundled player

pub mod http;

pub use http::{create_router, AppError, AppResult, AppState};
