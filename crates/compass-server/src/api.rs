use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, Method},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use uuid::Uuid;

use compass_digest::{Delivery, DigestPipeline, DigestPreview, HistoryEntry, SweepReport};

use crate::config::ServerConfig;
use crate::error::ServerError;

#[derive(Clone)]
pub struct AppState {
    pub pipeline: DigestPipeline,
    pub config: Arc<ServerConfig>,
    /// Cancelled on shutdown; sweeps stop starting new relationships.
    pub shutdown: CancellationToken,
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        .route("/digest/{user_id}/{partner_id}/preview", get(preview_digest))
        .route("/digest/{user_id}/{partner_id}/send", post(send_digest))
        .route("/admin/sweep", post(admin_sweep))
        .route("/admin/digests/{user_id}/{partner_id}", get(admin_digest_history))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn preview_digest(
    State(state): State<AppState>,
    Path((user_id, partner_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<DigestPreview>, ServerError> {
    let preview = state.pipeline.preview_digest(user_id, partner_id).await?;
    Ok(Json(preview))
}

async fn send_digest(
    State(state): State<AppState>,
    Path((user_id, partner_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<Delivery>, ServerError> {
    let delivery = state.pipeline.send_digest(user_id, partner_id).await?;
    info!(user = %user_id, partner = %partner_id, digest = %delivery.digest_id, "on-demand digest sent");
    Ok(Json(delivery))
}

async fn admin_sweep(
    headers: HeaderMap,
    State(state): State<AppState>,
) -> Result<Json<SweepReport>, ServerError> {
    verify_admin_token(&headers, &state.config)?;

    info!("Admin triggered digest sweep");
    let report = state.pipeline.run_sweep(&state.shutdown).await?;
    Ok(Json(report))
}

async fn admin_digest_history(
    headers: HeaderMap,
    State(state): State<AppState>,
    Path((user_id, partner_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<Vec<HistoryEntry>>, ServerError> {
    verify_admin_token(&headers, &state.config)?;

    let history = state.pipeline.digest_history(user_id, partner_id).await?;
    Ok(Json(history))
}

fn verify_admin_token(headers: &HeaderMap, config: &ServerConfig) -> Result<(), ServerError> {
    let Some(ref expected) = config.admin_token else {
        return Err(ServerError::Forbidden(
            "Admin API is disabled (no ADMIN_TOKEN configured)".into(),
        ));
    };

    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    let token = auth.strip_prefix("Bearer ").unwrap_or(auth);

    use subtle::ConstantTimeEq;
    let token_bytes = token.as_bytes();
    let expected_bytes = expected.as_bytes();
    if token_bytes.len() != expected_bytes.len()
        || token_bytes.ct_eq(expected_bytes).unwrap_u8() != 1
    {
        return Err(ServerError::Forbidden("Invalid admin token".into()));
    }

    Ok(())
}

pub async fn serve(
    state: AppState,
    addr: std::net::SocketAddr,
    shutdown: CancellationToken,
) -> anyhow::Result<()> {
    let app = build_router(state);

    info!(addr = %addr, "Starting HTTP API server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;

    Ok(())
}
