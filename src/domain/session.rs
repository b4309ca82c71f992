use super::tip::FailureKind;
use serde::Serialize;

/// Lifecycle of a single tip attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "message", rename_all = "snake_case")]
pub enum SubmissionState {
    Idle,
    AwaitingConfirmation,
    Processing,
    Succeeded(String),
    Failed(String),
}

impl SubmissionState {
    pub fn is_processing(&self) -> bool {
        matches!(self, SubmissionState::Processing)
    }
}

/// Inline messages rendered next to each input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FieldErrors {
    pub amount: Option<String>,
    pub phone: Option<String>,
}

/// Read-only view of a session handed to the host for rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSnapshot {
    pub state: SubmissionState,
    pub field_errors: FieldErrors,
    pub amount_input: String,
    pub phone_input: String,
    pub last_failure: Option<FailureKind>,
    /// Mirrors the pay button: enabled while idle with an amount >= 1 and at
    /// least nine characters of phone input.
    pub can_submit: bool,
}
