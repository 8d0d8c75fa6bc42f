pub mod health;
pub mod screens;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::state::AppState;

/// Room for a 5 MiB resume plus multipart framing. Anything between that and
/// the limit reaches validation and gets a readable message.
const BODY_LIMIT: usize = 16 * 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(screens::handle_page))
        .route("/health", get(health::health_handler))
        .route("/resume-file", post(screens::handle_resume_file))
        .route("/screens/:screen", post(screens::handle_switch_screen))
        .route("/screens/:screen/:action", post(screens::handle_action))
        .route("/download", get(screens::handle_download))
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
        .with_state(state)
}
