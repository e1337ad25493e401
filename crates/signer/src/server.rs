pub mod sign_rpm;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    Router,
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{any, get},
};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::audit::{AuditLog, TracingAuditLog};
use crate::auth::{Authenticator, authenticate};
use crate::config::ServerConfig;
use crate::keys::{KeyMap, SeedTokenDecoder, TokenDecoder};
use crate::policy::{AccessPolicy, RolePolicy};
use crate::rpm::{PackageSigner, RpmStreamSigner};

/// Collaborators shared by every request. Built once at startup and
/// never mutated afterwards.
#[derive(Clone)]
pub struct AppState {
    pub keys: Arc<KeyMap>,
    pub policy: Arc<dyn AccessPolicy>,
    pub decoder: Arc<dyn TokenDecoder>,
    pub signer: Arc<dyn PackageSigner>,
    pub audit: Arc<dyn AuditLog>,
    pub authenticator: Arc<Authenticator>,
}

impl AppState {
    pub fn from_config(config: &ServerConfig) -> Self {
        Self {
            keys: Arc::new(KeyMap::from_config(config)),
            policy: Arc::new(RolePolicy::from_config(config)),
            decoder: Arc::new(SeedTokenDecoder),
            signer: Arc::new(RpmStreamSigner),
            audit: Arc::new(TracingAuditLog),
            authenticator: Arc::new(Authenticator::from_config(config)),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/sign_rpm", any(sign_rpm::sign_rpm_handler))
        .route_layer(middleware::from_fn_with_state(
            state.authenticator.clone(),
            authenticate,
        ))
        .route(
            "/healthcheck",
            get(|| async move { (StatusCode::OK, "Ok").into_response() }),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run(host: String, port: u16, state: AppState) -> Result<()> {
    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;

    info!(addr = %addr, keys = state.keys.len(), "signing server listening");

    axum::serve(
        listener,
        router(state).into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("serving http")?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}
