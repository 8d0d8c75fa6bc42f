mod config;
mod controller;
mod errors;
mod models;
mod remote;
mod render;
mod routes;
mod sanitize;
mod session;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower::ServiceBuilder;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::{info, Level};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::controller::{Controller, ControllerSettings};
use crate::remote::HttpResumeService;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(default_log_filter(&config.rust_log))),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting JobGenie v{}", env!("CARGO_PKG_VERSION"));

    let service = HttpResumeService::new(
        config.api_endpoint.clone(),
        config.upload_endpoint.clone(),
    )?;
    info!(
        api = %config.api_endpoint,
        upload = %config.upload_endpoint,
        "resume service client initialized"
    );

    let controller = Controller::new(Arc::new(service), ControllerSettings::from_config(&config));
    let state = AppState { controller };

    let trace = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO));
    let app = build_router(state).layer(ServiceBuilder::new().layer(trace));

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Filter used when `RUST_LOG` is not set: our own events plus the request
/// traces from `tower_http`.
fn default_log_filter(level: &str) -> String {
    format!("{}={level},tower_http={level}", env!("CARGO_PKG_NAME"))
}
