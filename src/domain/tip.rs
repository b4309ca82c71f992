use super::amount::{TipAmount, validate_amount};
use super::phone::{NormalizedPhone, validate_phone};
use super::session::FieldErrors;
use crate::error::TipError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque payee identifier supplied by the hosting page.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecipientId(String);

impl RecipientId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecipientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A validated tip, ready to be handed to a [`PaymentGateway`](super::ports::PaymentGateway).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TipRequest {
    pub amount: TipAmount,
    pub raw_phone_input: String,
    pub normalized_phone: NormalizedPhone,
    pub recipient_id: RecipientId,
}

impl TipRequest {
    /// Validates both fields, reporting every failing one at once.
    pub fn validate(
        amount_input: &str,
        phone_input: &str,
        recipient_id: RecipientId,
    ) -> Result<Self, FieldErrors> {
        let amount = validate_amount(amount_input);
        let phone = validate_phone(phone_input);

        match (amount, phone) {
            (Ok(amount), Ok(normalized_phone)) => Ok(Self {
                amount,
                raw_phone_input: phone_input.to_string(),
                normalized_phone,
                recipient_id,
            }),
            (amount, phone) => Err(FieldErrors {
                amount: amount.err().map(|e| e.to_string()),
                phone: phone.err().map(|e| e.to_string()),
            }),
        }
    }
}

/// Classification of a failed payment attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The handset could not be reached; the phone field should be flagged.
    PhoneUnreachable,
    Timeout,
    Unavailable,
    Rejected,
    Internal,
    Cancelled,
}

impl FailureKind {
    pub fn is_phone_related(self) -> bool {
        self == FailureKind::PhoneUnreachable
    }

    /// Best-effort classification for sources that only return free text.
    ///
    /// Only adapters speaking an untyped protocol call this; the session works
    /// with the kind alone.
    pub fn classify_message(message: &str) -> Self {
        let lower = message.to_lowercase();
        if lower.contains("phone") {
            FailureKind::PhoneUnreachable
        } else if lower.contains("timed out") || lower.contains("timeout") {
            FailureKind::Timeout
        } else if lower.contains("busy") || lower.contains("unavailable") {
            FailureKind::Unavailable
        } else if lower.contains("internal") {
            FailureKind::Internal
        } else {
            FailureKind::Rejected
        }
    }

    pub fn into_error(self, message: String) -> TipError {
        match self {
            FailureKind::PhoneUnreachable | FailureKind::Rejected => {
                TipError::GatewayRejected(message)
            }
            FailureKind::Timeout => TipError::GatewayTimeout(message),
            FailureKind::Unavailable => TipError::GatewayUnavailable(message),
            FailureKind::Internal => TipError::InternalError(message),
            FailureKind::Cancelled => TipError::Cancelled,
        }
    }
}

/// Settled outcome of a payment request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayResult {
    Success { message: String },
    Failure { kind: FailureKind, message: String },
}

impl GatewayResult {
    pub fn success(message: impl Into<String>) -> Self {
        GatewayResult::Success {
            message: message.into(),
        }
    }

    pub fn failure(kind: FailureKind, message: impl Into<String>) -> Self {
        GatewayResult::Failure {
            kind,
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, GatewayResult::Success { .. })
    }

    pub fn message(&self) -> &str {
        match self {
            GatewayResult::Success { message } | GatewayResult::Failure { message, .. } => message,
        }
    }
}

/// Request body exchanged with the payment backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StkPushRequest {
    pub amount: u64,
    /// Nine subscriber digits, no country code.
    pub phone: String,
    pub recipient_id: String,
}

impl From<&TipRequest> for StkPushRequest {
    fn from(request: &TipRequest) -> Self {
        Self {
            amount: request.amount.value(),
            phone: request.normalized_phone.local_part().to_string(),
            recipient_id: request.recipient_id.as_str().to_string(),
        }
    }
}

/// Response body returned by the payment backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StkPushResponse {
    pub success: bool,
    pub message: String,
}

impl From<&GatewayResult> for StkPushResponse {
    fn from(result: &GatewayResult) -> Self {
        Self {
            success: result.is_success(),
            message: result.message().to_string(),
        }
    }
}

impl From<StkPushResponse> for GatewayResult {
    fn from(response: StkPushResponse) -> Self {
        if response.success {
            GatewayResult::success(response.message)
        } else {
            let kind = FailureKind::classify_message(&response.message);
            GatewayResult::failure(kind, response.message)
        }
    }
}
