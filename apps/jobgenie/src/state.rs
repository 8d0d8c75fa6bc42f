use crate::controller::Controller;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Owns the session and the resume service behind it.
    pub controller: Controller,
}
