//! Admin and presentation HTTP surface.
//!
//! Thin wrappers over the core: a settings form backend, the live preview,
//! and the last-run/status displays. No business logic beyond default-value
//! substitution lives here.

mod routes;

pub use routes::router;

use crate::reminder::{JobRunner, SchedulePlanner};
use crate::scheduler::RecurringScheduler;
use crate::settings::SettingsStore;
use anyhow::{Context, Result};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

#[derive(Clone)]
pub struct ServerState {
    pub settings_store: Arc<dyn SettingsStore>,
    pub runner: Arc<JobRunner>,
    pub planner: Arc<SchedulePlanner>,
    pub scheduler: Arc<dyn RecurringScheduler>,
}

pub async fn run_server(state: ServerState, port: u16, shutdown: CancellationToken) -> Result<()> {
    let app = routes::router(state);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port))
        .await
        .with_context(|| format!("Failed to bind port {}", port))?;
    info!("Admin interface listening on port {}", port);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;

    Ok(())
}
