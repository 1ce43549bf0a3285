pub mod error;
pub mod routes;

use anyhow::Context;
use axum::routing::{get, post};
use axum::Router;
use serde::Deserialize;
use std::sync::Arc;

use crate::pipeline::Satirist;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:5000";

#[derive(Deserialize, Debug, Clone, Default)]
pub struct ServerConfig {
    #[serde(rename = "bind_addr")]
    pub bind_addr: Option<String>,
}

/// Shared across handlers; never mutated after startup.
#[derive(Clone)]
pub struct AppState {
    pub satirist: Arc<Satirist>,
}

impl AppState {
    pub fn new(satirist: Satirist) -> Self {
        Self {
            satirist: Arc::new(satirist),
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(routes::health))
        .route("/satire", post(routes::generate_satire))
        .route("/models", get(routes::list_models))
        .with_state(state)
}

pub async fn run_server(config: &ServerConfig, satirist: Satirist) -> anyhow::Result<()> {
    let bind_addr = config
        .bind_addr
        .as_deref()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or(DEFAULT_BIND_ADDR);
    let app = create_router(AppState::new(satirist));

    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("Binding {}", bind_addr))?;
    log::info!("listening on http://{}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Serving HTTP")?;
    log::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        log::error!("failed to listen for shutdown signal: {}", err);
        std::future::pending::<()>().await;
    }
    log::info!("shutting down");
}
