use crate::config::AppConfig;
use crate::domain::amount::{sanitize_custom_amount, validate_amount};
use crate::domain::ports::{PaymentGateway, SharedPaymentGateway};
use crate::domain::session::{FieldErrors, SessionSnapshot, SubmissionState};
use crate::domain::tip::{FailureKind, GatewayResult, RecipientId, TipRequest};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

pub const TIMEOUT_MESSAGE: &str =
    "The request timed out. Please check your network connection and try again.";
pub const CANCELLED_MESSAGE: &str = "The payment request was cancelled.";
pub const INTERNAL_ERROR_MESSAGE: &str = "An internal error occurred. Please try again later.";

const MIN_PHONE_CHARS: usize = 9;

/// Knobs a host can tune per session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSettings {
    /// Amount the form starts with and returns to after a successful tip.
    pub default_tip: u64,
    /// Amounts offered as one-tap choices.
    pub preset_tips: Vec<u64>,
    pub request_timeout: Duration,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

impl From<&AppConfig> for SessionSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            default_tip: config.default_tip,
            preset_tips: config.preset_tips.clone(),
            request_timeout: config.request_timeout(),
        }
    }
}

struct SessionInner {
    state: SubmissionState,
    amount_input: String,
    phone_input: String,
    field_errors: FieldErrors,
    pending: Option<TipRequest>,
    last_submitted: Option<TipRequest>,
    last_failure: Option<FailureKind>,
    closed: bool,
}

enum Field {
    Amount,
    Phone,
}

/// Owns one tip attempt from form input to a terminal outcome.
///
/// Every transition goes through this type. The state lock is never held
/// while the gateway is awaited, so the session can be shared between tasks;
/// the `Processing` guard is what keeps a second request from being sent.
pub struct TippingSession {
    gateway: SharedPaymentGateway,
    recipient_id: RecipientId,
    settings: SessionSettings,
    shutdown: CancellationToken,
    inner: Mutex<SessionInner>,
}

impl TippingSession {
    /// Creates a new session for `recipient_id`.
    ///
    /// # Arguments
    ///
    /// * `gateway` - Where confirmed requests are sent.
    /// * `recipient_id` - Passed through to the gateway untouched.
    /// * `settings` - Default amount and request timeout.
    pub fn new(
        gateway: SharedPaymentGateway,
        recipient_id: RecipientId,
        settings: SessionSettings,
    ) -> Self {
        let inner = SessionInner {
            state: SubmissionState::Idle,
            amount_input: settings.default_tip.to_string(),
            phone_input: String::new(),
            field_errors: FieldErrors::default(),
            pending: None,
            last_submitted: None,
            last_failure: None,
            closed: false,
        };
        Self {
            gateway,
            recipient_id,
            settings,
            shutdown: CancellationToken::new(),
            inner: Mutex::new(inner),
        }
    }

    pub fn recipient_id(&self) -> &RecipientId {
        &self.recipient_id
    }

    pub async fn state(&self) -> SubmissionState {
        self.inner.lock().await.state.clone()
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        let inner = self.inner.lock().await;
        let can_submit = !inner.closed
            && inner.state == SubmissionState::Idle
            && validate_amount(&inner.amount_input).is_ok()
            && inner.phone_input.chars().count() >= MIN_PHONE_CHARS;

        SessionSnapshot {
            state: inner.state.clone(),
            field_errors: inner.field_errors.clone(),
            amount_input: inner.amount_input.clone(),
            phone_input: inner.phone_input.clone(),
            last_failure: inner.last_failure,
            can_submit,
        }
    }

    pub async fn set_amount(&self, input: &str) {
        self.edit(Field::Amount, input.to_string()).await;
    }

    pub fn presets(&self) -> &[u64] {
        &self.settings.preset_tips
    }

    /// Picks one of the configured preset amounts.
    ///
    /// Returns `false` and leaves the form untouched when `amount` is not a
    /// preset.
    pub async fn select_preset(&self, amount: u64) -> bool {
        if !self.settings.preset_tips.contains(&amount) {
            debug!(amount, "Ignoring unknown preset");
            return false;
        }
        self.edit(Field::Amount, amount.to_string()).await;
        true
    }

    /// Custom amount entry; everything but digits is dropped.
    pub async fn set_custom_amount(&self, input: &str) {
        self.edit(Field::Amount, sanitize_custom_amount(input)).await;
    }

    pub async fn set_phone(&self, input: &str) {
        self.edit(Field::Phone, input.to_string()).await;
    }

    async fn edit(&self, field: Field, value: String) {
        let mut inner = self.inner.lock().await;
        if inner.closed || inner.state.is_processing() {
            debug!("Ignoring edit while {:?}", inner.state);
            return;
        }

        // Leaving a terminal state starts a fresh attempt, including any
        // field error the gateway attached.
        if matches!(
            inner.state,
            SubmissionState::Succeeded(_) | SubmissionState::Failed(_)
        ) {
            inner.field_errors = FieldErrors::default();
        }

        match field {
            Field::Amount => {
                inner.amount_input = value;
                inner.field_errors.amount = None;
            }
            Field::Phone => {
                inner.phone_input = value;
                inner.field_errors.phone = None;
            }
        }
        inner.state = SubmissionState::Idle;
        inner.pending = None;
        inner.last_submitted = None;
        inner.last_failure = None;
    }

    /// Validates the form and, when both fields pass, asks for confirmation.
    ///
    /// Nothing is sent to the gateway here. Only accepted while `Idle`: after
    /// a failure, use [`retry`](Self::retry) to resend the same request or
    /// edit a field to start over.
    pub async fn submit(&self) -> SubmissionState {
        let mut inner = self.inner.lock().await;
        if inner.closed || inner.state != SubmissionState::Idle {
            debug!("Ignoring submit while {:?}", inner.state);
            return inner.state.clone();
        }

        match TipRequest::validate(
            &inner.amount_input,
            &inner.phone_input,
            self.recipient_id.clone(),
        ) {
            Ok(request) => {
                debug!(
                    amount = request.amount.value(),
                    phone = %request.normalized_phone.masked(),
                    "Tip awaiting confirmation"
                );
                inner.field_errors = FieldErrors::default();
                inner.pending = Some(request);
                inner.state = SubmissionState::AwaitingConfirmation;
            }
            Err(errors) => {
                debug!(?errors, "Tip rejected by validation");
                inner.field_errors = errors;
            }
        }
        inner.state.clone()
    }

    pub async fn cancel(&self) -> SubmissionState {
        let mut inner = self.inner.lock().await;
        if inner.state == SubmissionState::AwaitingConfirmation {
            inner.pending = None;
            inner.state = SubmissionState::Idle;
        } else {
            debug!("Ignoring cancel while {:?}", inner.state);
        }
        inner.state.clone()
    }

    /// Sends the pending request and waits for the gateway to settle.
    ///
    /// A no-op unless the session is awaiting confirmation.
    pub async fn confirm(&self) -> SubmissionState {
        let request = {
            let mut inner = self.inner.lock().await;
            if inner.closed || inner.state != SubmissionState::AwaitingConfirmation {
                debug!("Ignoring confirm while {:?}", inner.state);
                return inner.state.clone();
            }
            let Some(request) = inner.pending.take() else {
                return inner.state.clone();
            };
            inner.last_submitted = Some(request.clone());
            inner.state = SubmissionState::Processing;
            request
        };

        self.dispatch(request).await
    }

    /// Replays the last submitted request after a failure.
    pub async fn retry(&self) -> SubmissionState {
        let request = {
            let mut inner = self.inner.lock().await;
            let retryable = matches!(inner.state, SubmissionState::Failed(_)) && !inner.closed;
            let Some(request) = inner.last_submitted.clone().filter(|_| retryable) else {
                debug!("Ignoring retry while {:?}", inner.state);
                return inner.state.clone();
            };
            inner.field_errors.phone = None;
            inner.last_failure = None;
            inner.state = SubmissionState::Processing;
            request
        };

        self.dispatch(request).await
    }

    /// Tears the session down. An in-flight request is abandoned and settles
    /// as cancelled; later events are ignored.
    pub async fn shutdown(&self) {
        self.shutdown.cancel();
        self.inner.lock().await.closed = true;
    }

    async fn dispatch(&self, request: TipRequest) -> SubmissionState {
        info!(
            amount = request.amount.value(),
            phone = %request.normalized_phone.masked(),
            recipient = %request.recipient_id,
            "Dispatching STK push"
        );

        let gateway = Arc::clone(&self.gateway);
        let mut handle = tokio::spawn(async move { gateway.request_payment(&request).await });

        let outcome = tokio::select! {
            _ = self.shutdown.cancelled() => None,
            joined = tokio::time::timeout(self.settings.request_timeout, &mut handle) => Some(joined),
        };

        let result = match outcome {
            Some(Ok(Ok(result))) => result,
            Some(Ok(Err(join_error))) => {
                error!("Payment gateway task failed: {}", join_error);
                GatewayResult::failure(FailureKind::Internal, INTERNAL_ERROR_MESSAGE)
            }
            Some(Err(_elapsed)) => {
                handle.abort();
                GatewayResult::failure(FailureKind::Timeout, TIMEOUT_MESSAGE)
            }
            None => {
                handle.abort();
                GatewayResult::failure(FailureKind::Cancelled, CANCELLED_MESSAGE)
            }
        };

        self.settle(result).await
    }

    async fn settle(&self, result: GatewayResult) -> SubmissionState {
        let mut inner = self.inner.lock().await;
        match result {
            GatewayResult::Success { message } => {
                info!("STK push accepted");
                inner.amount_input = self.settings.default_tip.to_string();
                inner.phone_input.clear();
                inner.field_errors = FieldErrors::default();
                inner.last_submitted = None;
                inner.last_failure = None;
                inner.state = SubmissionState::Succeeded(message);
            }
            GatewayResult::Failure { kind, message } => {
                warn!(?kind, "STK push failed: {}", message);
                if kind.is_phone_related() {
                    inner.field_errors.phone = Some(message.clone());
                }
                inner.last_failure = Some(kind);
                inner.state = SubmissionState::Failed(message);
            }
        }
        inner.state.clone()
    }
}
