//! Backend endpoint for STK push requests.
//!
//! This is the trusted side of the tipping flow: it re-validates every
//! request and is the only place provider credentials live.

pub mod handlers;

use crate::config::ProviderCredentials;
use crate::domain::ports::SharedPaymentGateway;
use crate::error::Result;
use crate::infrastructure::http::STK_PUSH_PATH;
use axum::Router;
use axum::routing::{get, post};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};

pub struct BackendState {
    pub provider: SharedPaymentGateway,
    pub credentials: Option<ProviderCredentials>,
}

impl BackendState {
    pub fn new(provider: SharedPaymentGateway, credentials: Option<ProviderCredentials>) -> Self {
        Self {
            provider,
            credentials,
        }
    }
}

pub fn router(state: Arc<BackendState>) -> Router {
    Router::new()
        .route(STK_PUSH_PATH, post(handlers::stk_push))
        .route("/health", get(handlers::health))
        .with_state(state)
}

/// Serves the backend on an already bound listener until the task is dropped.
pub async fn serve(listener: TcpListener, state: Arc<BackendState>) -> Result<()> {
    if state.credentials.is_none() {
        warn!("MPESA_CONSUMER_KEY / MPESA_CONSUMER_SECRET not set");
    }
    info!("Payment backend listening on {}", listener.local_addr()?);

    axum::serve(listener, router(state)).await?;
    Ok(())
}
