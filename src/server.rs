//! HTTP Server
//!
//! axum router exposing the passel operations under `/v1`. Each handler resolves a fresh
//! `PasselContext` from the peer directory and hands it to the coordinator.

use crate::concurrency::PossumLockManager;
use crate::config::PossumConfig;
use crate::coordinator::PasselCoordinator;
use crate::directory::{ConfigDirectory, PeerDirectory};
use crate::error::PasselError;
use crate::peer::HttpPeerClient;
use crate::store::{SledStateStore, StateStore};
use axum::http::HeaderValue;
use axum::routing::get;
use axum::Router;
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

mod auth;
mod handlers;
mod response;

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub coordinator: Arc<PasselCoordinator>,
    pub directory: Arc<dyn PeerDirectory>,
}

impl AppState {
    pub fn new(coordinator: Arc<PasselCoordinator>, directory: Arc<dyn PeerDirectory>) -> Self {
        Self {
            coordinator,
            directory,
        }
    }
}

/// Build the `/v1` router with CORS and request tracing
pub fn build_router(state: AppState, cors_allowed: &str) -> Result<Router, PasselError> {
    let cors = cors_layer(cors_allowed)?;

    Ok(Router::new()
        .route("/v1/state", get(handlers::get_state).post(handlers::set_state))
        .route(
            "/v1/passel_state",
            get(handlers::get_passel_state).post(handlers::set_passel_state),
        )
        .route(
            "/v1/passel_state_consistency",
            get(handlers::get_passel_state_consistency),
        )
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state))
}

fn cors_layer(cors_allowed: &str) -> Result<CorsLayer, PasselError> {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if cors_allowed.trim() == "*" {
        return Ok(layer.allow_origin(Any));
    }
    let origin = HeaderValue::from_str(cors_allowed.trim()).map_err(|e| {
        PasselError::Configuration(format!("Invalid CORS origin '{}': {}", cors_allowed, e))
    })?;
    Ok(layer.allow_origin(origin))
}

/// A possum instance wired from configuration
pub struct PossumServer {
    state: AppState,
    cors_allowed: String,
}

impl PossumServer {
    /// Open and seed the store, then assemble coordinator and directory
    pub fn from_config(config: &PossumConfig) -> Result<Self, PasselError> {
        let directory = Arc::new(ConfigDirectory::from_config(config));
        let passel = directory.passel()?;

        let store = Arc::new(SledStateStore::new(&config.storage.path)?);
        store.initialize(&passel)?;
        info!(
            store = %config.storage.path.display(),
            members = passel.len(),
            "State store ready"
        );

        let peers = Arc::new(HttpPeerClient::new(&config.peer)?);
        let coordinator = Arc::new(PasselCoordinator::new(
            store,
            peers,
            Arc::new(PossumLockManager::new()),
        ));

        Ok(Self {
            state: AppState::new(coordinator, directory),
            cors_allowed: config.server.cors_allowed.clone(),
        })
    }

    pub fn router(&self) -> Result<Router, PasselError> {
        build_router(self.state.clone(), &self.cors_allowed)
    }

    /// Serve on an already bound listener until `shutdown` resolves
    pub async fn run<F>(self, listener: TcpListener, shutdown: F) -> Result<(), PasselError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let router = self.router()?;
        if let Ok(addr) = listener.local_addr() {
            info!(address = %addr, "Possum listening");
        }
        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| PasselError::Configuration(format!("Server error: {}", e)))
    }
}

/// Bind the configured address and serve until Ctrl-C
pub async fn serve(config: &PossumConfig) -> Result<(), PasselError> {
    let server = PossumServer::from_config(config)?;
    let addr = format!("{}:{}", config.server.bind_address, config.server.port);
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| PasselError::Configuration(format!("Failed to bind {}: {}", addr, e)))?;
    server.run(listener, shutdown_signal()).await?;
    info!("Possum stopped");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutdown requested");
    }
}
