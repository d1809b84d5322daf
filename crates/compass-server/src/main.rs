//! # compass-server
//!
//! Partner digest service.
//!
//! This binary provides:
//! - **On-demand digests**: preview or send the digest for one
//!   (user, partner) pair over HTTP
//! - **Scheduled sweeps**: a background task delivering the weekly digest for
//!   every consenting relationship
//! - **Admin sweep trigger** protected by a bearer token

mod api;
mod config;
mod error;
mod scheduler;

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use compass_digest::{DigestPipeline, HttpRelayTransport, LogTransport, MessageTransport};
use compass_store::{Database, SharedDatabase};

use crate::api::AppState;
use crate::config::ServerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // -----------------------------------------------------------------------
    // 1. Initialize tracing (respects RUST_LOG env var)
    // -----------------------------------------------------------------------
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("info,compass_server=debug,compass_digest=debug")
        }))
        .init();

    info!("Starting partner digest server v{}", env!("CARGO_PKG_VERSION"));

    // -----------------------------------------------------------------------
    // 2. Load configuration
    // -----------------------------------------------------------------------
    let config = ServerConfig::from_env();
    info!(
        http_addr = %config.http_addr,
        relay_configured = config.mail_relay_url.is_some(),
        admin_enabled = config.admin_token.is_some(),
        concurrency = config.concurrency,
        sweep_interval_secs = config.sweep_interval.map(|d| d.as_secs()),
        "Loaded configuration"
    );

    // -----------------------------------------------------------------------
    // 3. Initialize subsystems
    // -----------------------------------------------------------------------
    let database = match &config.database_path {
        Some(path) => Database::open_at(path)?,
        None => Database::new()?,
    };
    let db = SharedDatabase::new(database);

    let transport: Arc<dyn MessageTransport> = match config.transport_config() {
        Some(relay) => {
            info!(endpoint = %relay.endpoint, "Using HTTP mail relay");
            Arc::new(HttpRelayTransport::new(relay)?)
        }
        None => {
            warn!("MAIL_RELAY_URL not set, digests will be logged instead of sent");
            Arc::new(LogTransport)
        }
    };

    let pipeline = DigestPipeline::new(db, transport, config.digest_config());
    info!(
        window_days = pipeline.config().window.num_days(),
        send_timeout_secs = pipeline.config().send_timeout.as_secs(),
        "Digest pipeline ready"
    );
    let shutdown = CancellationToken::new();

    // -----------------------------------------------------------------------
    // 4. Spawn background tasks
    // -----------------------------------------------------------------------
    let scheduler = config.sweep_interval.map(|period| {
        scheduler::spawn_sweep_scheduler(pipeline.clone(), period, shutdown.clone())
    });

    let app_state = AppState {
        pipeline,
        config: Arc::new(config.clone()),
        shutdown: shutdown.clone(),
    };

    // -----------------------------------------------------------------------
    // 5. Run the HTTP API server until Ctrl+C
    // -----------------------------------------------------------------------
    let mut server = tokio::spawn(api::serve(app_state, config.http_addr, shutdown.clone()));

    tokio::select! {
        result = &mut server => {
            shutdown.cancel();
            match result {
                Ok(Err(e)) => {
                    tracing::error!(error = %e, "HTTP server failed");
                    return Err(e);
                }
                Err(e) => return Err(e.into()),
                Ok(Ok(())) => {}
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
            shutdown.cancel();
            match server.await {
                Ok(Err(e)) => warn!(error = %e, "HTTP server failed during shutdown"),
                Err(e) => warn!(error = %e, "HTTP server task ended abnormally"),
                Ok(Ok(())) => {}
            }
        }
    }

    // In-flight sweep runs finish; no new relationships are started.
    if let Some(handle) = scheduler {
        if let Err(e) = handle.await {
            warn!(error = %e, "scheduler task ended abnormally");
        }
    }

    Ok(())
}
