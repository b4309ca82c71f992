use super::tip::{GatewayResult, TipRequest};
use async_trait::async_trait;
use std::sync::Arc;

/// Boundary to whatever actually sends the STK push.
///
/// Implementations never error out of band: transport problems, provider
/// rejections and internal faults all settle as [`GatewayResult::Failure`].
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn request_payment(&self, request: &TipRequest) -> GatewayResult;
}

pub type SharedPaymentGateway = Arc<dyn PaymentGateway>;

