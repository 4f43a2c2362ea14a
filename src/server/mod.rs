// src/server/mod.rs

//! HTTP and WebSocket surface over [`ExecutionOrchestrator`].

pub mod error;
pub mod extract;
pub mod handlers;
pub mod ws;

use std::future::Future;
use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tokio::net::TcpListener;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::auth::IdentityService;
use crate::engine::ExecutionOrchestrator;

pub use error::ErrorBody;
pub use extract::Owner;

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<ExecutionOrchestrator>,
    pub identity: Arc<dyn IdentityService>,
}

impl AppState {
    pub fn new(
        orchestrator: Arc<ExecutionOrchestrator>,
        identity: Arc<dyn IdentityService>,
    ) -> Self {
        Self {
            orchestrator,
            identity,
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/run", post(handlers::run_file))
        .route("/run/command", post(handlers::run_command))
        .route("/run/stop", post(handlers::stop_run))
        .route("/run/sessions", get(handlers::list_sessions))
        .route("/run/sessions/{id}", get(handlers::describe_session))
        .route("/events", get(ws::events))
        .layer(CatchPanicLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve until `shutdown` resolves.
pub async fn serve(
    listener: TcpListener,
    state: AppState,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "listening");
    }
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}
