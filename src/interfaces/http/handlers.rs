use super::BackendState;
use crate::domain::amount::validate_amount;
use crate::domain::phone::validate_phone;
use crate::domain::ports::PaymentGateway;
use crate::domain::tip::{GatewayResult, RecipientId, StkPushResponse, TipRequest};
use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{error, info};

pub const MISSING_FIELDS_MESSAGE: &str =
    "Missing required fields: amount, phone, or recipientId.";
pub const INVALID_AMOUNT_MESSAGE: &str = "Amount must be a number and at least 1 KES.";
pub const INVALID_PHONE_MESSAGE: &str =
    "Invalid phone number. Please use a valid Safaricom number.";
pub const INTERNAL_SERVER_ERROR_MESSAGE: &str = "An internal server error occurred.";

pub type ApiResponse = (StatusCode, Json<StkPushResponse>);

fn reply(status: StatusCode, success: bool, message: impl Into<String>) -> ApiResponse {
    (
        status,
        Json(StkPushResponse {
            success,
            message: message.into(),
        }),
    )
}

fn bad_request(message: &str) -> ApiResponse {
    reply(StatusCode::BAD_REQUEST, false, message)
}

/// `POST /api/mpesa`
///
/// Re-validates everything the client sent; the client-side checks are only
/// for fast feedback.
pub async fn stk_push(State(state): State<Arc<BackendState>>, body: Bytes) -> ApiResponse {
    let Ok(payload) = serde_json::from_slice::<Value>(&body) else {
        return bad_request(MISSING_FIELDS_MESSAGE);
    };

    let request = match parse_request(&payload) {
        Ok(request) => request,
        Err(response) => return response,
    };

    info!(
        "[backend] Initiating STK push to {} for {} KES for recipient {}",
        request.normalized_phone.masked(),
        request.amount,
        request.recipient_id
    );

    let provider = Arc::clone(&state.provider);
    let outcome = tokio::spawn(async move { provider.request_payment(&request).await }).await;

    match outcome {
        Ok(GatewayResult::Success { message }) => reply(StatusCode::OK, true, message),
        Ok(GatewayResult::Failure { message, .. }) => {
            reply(StatusCode::INTERNAL_SERVER_ERROR, false, message)
        }
        Err(e) => {
            error!("[backend] provider task failed: {}", e);
            reply(
                StatusCode::INTERNAL_SERVER_ERROR,
                false,
                INTERNAL_SERVER_ERROR_MESSAGE,
            )
        }
    }
}

fn parse_request(payload: &Value) -> Result<TipRequest, ApiResponse> {
    let amount = payload.get("amount").filter(|v| !v.is_null());
    let phone = non_empty_str(payload, "phone");
    let recipient_id = non_empty_str(payload, "recipientId");

    let (Some(amount), Some(phone), Some(recipient_id)) = (amount, phone, recipient_id) else {
        return Err(bad_request(MISSING_FIELDS_MESSAGE));
    };

    let amount = match amount {
        Value::Number(number) => validate_amount(&number.to_string()).ok(),
        _ => None,
    }
    .ok_or_else(|| bad_request(INVALID_AMOUNT_MESSAGE))?;

    let normalized_phone = validate_phone(phone).map_err(|_| bad_request(INVALID_PHONE_MESSAGE))?;

    Ok(TipRequest {
        amount,
        raw_phone_input: phone.to_string(),
        normalized_phone,
        recipient_id: RecipientId::new(recipient_id),
    })
}

fn non_empty_str<'a>(payload: &'a Value, key: &str) -> Option<&'a str> {
    payload
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub provider_credentials: bool,
}

/// `GET /health`
pub async fn health(State(state): State<Arc<BackendState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        provider_credentials: state.credentials.is_some(),
    })
}
