use crate::application::session::{INTERNAL_ERROR_MESSAGE, TIMEOUT_MESSAGE};
use crate::domain::ports::PaymentGateway;
use crate::domain::tip::{FailureKind, GatewayResult, StkPushRequest, StkPushResponse, TipRequest};
use crate::error::Result;
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, warn};

pub const UNAVAILABLE_MESSAGE: &str =
    "Could not reach the payment service. Please check your connection and try again.";

pub const STK_PUSH_PATH: &str = "/api/mpesa";

/// Gateway adapter that forwards requests to a payment backend over HTTP.
///
/// Speaks the `{ amount, phone, recipientId }` / `{ success, message }`
/// contract served by [`crate::interfaces::http`].
pub struct HttpGateway {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpGateway {
    /// # Arguments
    ///
    /// * `base_url` - Backend origin, e.g. `http://127.0.0.1:8080`.
    /// * `timeout` - Per-request timeout enforced by the HTTP client.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        let endpoint = format!("{}{}", base_url.trim_end_matches('/'), STK_PUSH_PATH);
        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl PaymentGateway for HttpGateway {
    async fn request_payment(&self, request: &TipRequest) -> GatewayResult {
        let body = StkPushRequest::from(request);

        let response = match self.client.post(&self.endpoint).json(&body).send().await {
            Ok(response) => response,
            Err(e) if e.is_timeout() => {
                warn!("Payment backend timed out: {}", e);
                return GatewayResult::failure(FailureKind::Timeout, TIMEOUT_MESSAGE);
            }
            Err(e) => {
                warn!("Payment backend unreachable: {}", e);
                return GatewayResult::failure(FailureKind::Unavailable, UNAVAILABLE_MESSAGE);
            }
        };

        let status = response.status();
        debug!(%status, "Payment backend responded");

        match response.json::<StkPushResponse>().await {
            Ok(reply) if status.is_success() => GatewayResult::from(reply),
            Ok(reply) => GatewayResult::from(StkPushResponse {
                success: false,
                message: reply.message,
            }),
            Err(e) => {
                warn!(%status, "Undecodable payment backend response: {}", e);
                GatewayResult::failure(FailureKind::Internal, INTERNAL_ERROR_MESSAGE)
            }
        }
    }
}
