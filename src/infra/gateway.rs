//! HTTP host for the offline worker.
//!
//! The gateway stands in for the browser's network layer: one listener whose
//! fallback route hands every request to the worker. It carries no routes of
//! its own; the worker decides what is intercepted, what passes through, and
//! what falls back.

use std::{net::SocketAddr, sync::Arc};

use axum::{
    Router,
    body::Body,
    extract::State,
    http::Request,
    response::Response,
};
use tokio::net::TcpListener;
use tracing::info;

use crate::application::error::AppError;
use crate::worker::OfflineWorker;

use super::error::InfraError;

#[derive(Clone)]
pub struct GatewayState {
    pub worker: Arc<OfflineWorker>,
}

/// Build the gateway router: every request is answered by the worker.
pub fn build_router(state: GatewayState) -> Router {
    Router::new().fallback(intercept).with_state(state)
}

async fn intercept(State(state): State<GatewayState>, request: Request<Body>) -> Response {
    state.worker.handle(request).await
}

/// Bind and serve until the process is stopped.
pub async fn serve(addr: SocketAddr, state: GatewayState) -> Result<(), AppError> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;

    info!(target: "tavola::gateway", %addr, "gateway listening");

    axum::serve(listener, build_router(state).into_make_service())
        .await
        .map_err(|err| AppError::unexpected(format!("server error: {err}")))?;

    Ok(())
}
