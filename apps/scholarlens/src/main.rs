mod api_client;
mod attempt;
mod config;
mod demo;
mod errors;
mod models;
mod routes;
mod state;
mod upload;
mod views;

#[cfg(test)]
mod testing;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::api_client::ApiClient;
use crate::config::Config;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on unparseable env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting ScholarLens web v{}", env!("CARGO_PKG_VERSION"));

    // Initialize backend client
    let api = ApiClient::new(&config.api_base_url, config.http_timeout)?;
    info!(
        "API client initialized (base: {}, timeout: {:?})",
        config.api_base_url, config.http_timeout
    );

    // Probe the backend once; the site still starts without it
    match api.health().await {
        Ok(status) => info!("Backend health: {status}"),
        Err(err) => warn!("Backend health check failed: {err}"),
    }

    let state = AppState::new(config.clone(), Arc::new(api));

    // Build router
    let app = build_router(state.clone())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tokio::select! {
        r = axum::serve(listener, app) => {
            warn!("server ended unexpectedly: {:?}", &r)
        },
        _ = tokio::signal::ctrl_c() => {
            info!("received ctrl+c interrupt, closing server");
        }
    }

    state.teardown();
    Ok(())
}
