use crate::config::SimulatorConfig;
use crate::domain::ports::PaymentGateway;
use crate::domain::tip::{FailureKind, GatewayResult, TipRequest};
use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::info;

pub const SUCCESS_MESSAGE: &str =
    "STK push sent! Please check your phone and enter your M-Pesa PIN to complete the payment.";

/// Failure vocabulary of the simulator, drawn from uniformly.
pub const FAILURES: [(FailureKind, &str); 4] = [
    (
        FailureKind::PhoneUnreachable,
        "Could not initiate payment. The phone number seems to be offline.",
    ),
    (
        FailureKind::Timeout,
        "The request timed out. Please check your network connection and try again.",
    ),
    (
        FailureKind::Rejected,
        "An unknown M-Pesa error occurred. Please try again later.",
    ),
    (
        FailureKind::Unavailable,
        "The M-Pesa system is currently busy. Please wait a moment and try again.",
    ),
];

/// In-process stand-in for the mobile-money provider.
///
/// Waits `delay`, then succeeds with probability `success_rate`. Seed it for
/// reproducible runs.
pub struct SimulatedGateway {
    delay: Duration,
    success_rate: f64,
    rng: Mutex<StdRng>,
}

impl SimulatedGateway {
    pub fn new(delay: Duration, success_rate: f64) -> Self {
        Self::with_rng(delay, success_rate, StdRng::from_entropy())
    }

    pub fn with_seed(delay: Duration, success_rate: f64, seed: u64) -> Self {
        Self::with_rng(delay, success_rate, StdRng::seed_from_u64(seed))
    }

    pub fn from_config(config: &SimulatorConfig) -> Self {
        let delay = Duration::from_millis(config.delay_ms);
        match config.seed {
            Some(seed) => Self::with_seed(delay, config.success_rate, seed),
            None => Self::new(delay, config.success_rate),
        }
    }

    fn with_rng(delay: Duration, success_rate: f64, rng: StdRng) -> Self {
        // `gen_bool` panics outside [0, 1]; NaN counts as never succeeding.
        let success_rate = if success_rate.is_nan() {
            0.0
        } else {
            success_rate.clamp(0.0, 1.0)
        };
        Self {
            delay,
            success_rate,
            rng: Mutex::new(rng),
        }
    }

    async fn roll(&self) -> GatewayResult {
        let mut rng = self.rng.lock().await;
        if rng.gen_bool(self.success_rate) {
            GatewayResult::success(SUCCESS_MESSAGE)
        } else {
            let (kind, message) = FAILURES[rng.gen_range(0..FAILURES.len())];
            GatewayResult::failure(kind, message)
        }
    }
}

#[async_trait]
impl PaymentGateway for SimulatedGateway {
    async fn request_payment(&self, request: &TipRequest) -> GatewayResult {
        info!(
            "Simulating STK push to {} for {} KES for recipient {}",
            request.normalized_phone.masked(),
            request.amount,
            request.recipient_id
        );
        tokio::time::sleep(self.delay).await;
        self.roll().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::tip::RecipientId;
    use tokio::time::Instant;

    fn request() -> TipRequest {
        TipRequest::validate("100", "712345678", RecipientId::new("creator_123")).unwrap()
    }

    #[tokio::test]
    async fn test_always_succeeds_at_full_rate() {
        let gateway = SimulatedGateway::with_seed(Duration::ZERO, 1.0, 1);
        for _ in 0..20 {
            assert_eq!(
                gateway.request_payment(&request()).await,
                GatewayResult::success(SUCCESS_MESSAGE)
            );
        }
    }

    #[tokio::test]
    async fn test_failures_come_from_fixed_vocabulary() {
        let gateway = SimulatedGateway::with_seed(Duration::ZERO, 0.0, 2);
        for _ in 0..50 {
            match gateway.request_payment(&request()).await {
                GatewayResult::Failure { kind, message } => {
                    assert!(FAILURES.iter().any(|(k, m)| *k == kind && *m == message));
                }
                other => panic!("expected failure, got {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn test_outcome_distribution_is_roughly_eighty_twenty() {
        let gateway = SimulatedGateway::with_seed(Duration::ZERO, 0.8, 42);
        let mut successes = 0;
        for _ in 0..1000 {
            if gateway.request_payment(&request()).await.is_success() {
                successes += 1;
            }
        }
        assert!((700..=900).contains(&successes), "successes = {successes}");
    }

    #[tokio::test]
    async fn test_same_seed_same_outcomes() {
        let a = SimulatedGateway::with_seed(Duration::ZERO, 0.5, 9);
        let b = SimulatedGateway::with_seed(Duration::ZERO, 0.5, 9);
        for _ in 0..20 {
            assert_eq!(
                a.request_payment(&request()).await,
                b.request_payment(&request()).await
            );
        }
    }

    #[tokio::test]
    async fn test_waits_for_configured_delay() {
        let gateway = SimulatedGateway::with_seed(Duration::from_millis(50), 1.0, 3);
        let started = Instant::now();
        gateway.request_payment(&request()).await;
        assert!(started.elapsed() >= Duration::from_millis(50));
    }

    #[tokio::test]
    async fn test_nan_success_rate_always_fails() {
        let gateway = SimulatedGateway::with_seed(Duration::ZERO, f64::NAN, 4);
        for _ in 0..20 {
            assert!(!gateway.request_payment(&request()).await.is_success());
        }
    }
}
