#![allow(dead_code)]

use async_trait::async_trait;
use kahawa_tip::domain::ports::PaymentGateway;
use kahawa_tip::domain::tip::{GatewayResult, TipRequest};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::{Mutex, Notify};

/// Holds every request until `release` is called, then replies with `reply`.
pub struct GatedGateway {
    reply: GatewayResult,
    calls: AtomicUsize,
    seen: Mutex<Vec<TipRequest>>,
    started: Notify,
    release: Notify,
}

impl GatedGateway {
    pub fn new(reply: GatewayResult) -> Arc<Self> {
        Arc::new(Self {
            reply,
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
            started: Notify::new(),
            release: Notify::new(),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub async fn seen(&self) -> Vec<TipRequest> {
        self.seen.lock().await.clone()
    }

    pub async fn wait_started(&self) {
        self.started.notified().await;
    }

    pub fn release(&self) {
        self.release.notify_one();
    }
}

#[async_trait]
impl PaymentGateway for GatedGateway {
    async fn request_payment(&self, request: &TipRequest) -> GatewayResult {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().await.push(request.clone());
        self.started.notify_one();
        self.release.notified().await;
        self.reply.clone()
    }
}

/// Simulates a faulty adapter.
pub struct PanickingGateway;

#[async_trait]
impl PaymentGateway for PanickingGateway {
    async fn request_payment(&self, _request: &TipRequest) -> GatewayResult {
        panic!("provider client blew up");
    }
}
