use kahawa_tip::application::session::{SessionSettings, TippingSession};
use kahawa_tip::domain::ports::{PaymentGateway, SharedPaymentGateway};
use kahawa_tip::domain::session::SubmissionState;
use kahawa_tip::domain::tip::{FailureKind, GatewayResult, RecipientId, StkPushResponse, TipRequest};
use kahawa_tip::infrastructure::http::HttpGateway;
use kahawa_tip::infrastructure::simulated::{FAILURES, SUCCESS_MESSAGE, SimulatedGateway};
use kahawa_tip::interfaces::http::handlers::{
    INVALID_AMOUNT_MESSAGE, INVALID_PHONE_MESSAGE, MISSING_FIELDS_MESSAGE,
};
use kahawa_tip::interfaces::http::{BackendState, router};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

/// Starts the backend on an ephemeral port and returns its base URL.
async fn spawn_backend(success_rate: f64) -> String {
    let provider: SharedPaymentGateway =
        Arc::new(SimulatedGateway::with_seed(Duration::ZERO, success_rate, 5));
    let state = Arc::new(BackendState::new(provider, None));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router(state)).await.unwrap();
    });
    format!("http://{addr}")
}

async fn post(base_url: &str, body: serde_json::Value) -> (u16, StkPushResponse) {
    let response = reqwest::Client::new()
        .post(format!("{base_url}/api/mpesa"))
        .json(&body)
        .send()
        .await
        .unwrap();
    let status = response.status().as_u16();
    (status, response.json().await.unwrap())
}

#[tokio::test]
async fn test_backend_accepts_valid_request() {
    let base_url = spawn_backend(1.0).await;
    let (status, body) = post(
        &base_url,
        json!({ "amount": 100, "phone": "712345678", "recipientId": "creator_123" }),
    )
    .await;

    assert_eq!(status, 200);
    assert!(body.success);
    assert_eq!(body.message, SUCCESS_MESSAGE);
}

#[tokio::test]
async fn test_backend_maps_provider_failure_to_500() {
    let base_url = spawn_backend(0.0).await;
    let (status, body) = post(
        &base_url,
        json!({ "amount": 100, "phone": "0712345678", "recipientId": "creator_123" }),
    )
    .await;

    assert_eq!(status, 500);
    assert!(!body.success);
    assert!(FAILURES.iter().any(|(_, message)| *message == body.message));
}

#[tokio::test]
async fn test_backend_rejects_invalid_input_with_400() {
    let base_url = spawn_backend(1.0).await;

    let cases = [
        (json!({ "phone": "712345678", "recipientId": "c" }), MISSING_FIELDS_MESSAGE),
        (
            json!({ "amount": 0, "phone": "712345678", "recipientId": "c" }),
            INVALID_AMOUNT_MESSAGE,
        ),
        (
            json!({ "amount": 10, "phone": "812345678", "recipientId": "c" }),
            INVALID_PHONE_MESSAGE,
        ),
    ];
    for (payload, expected) in cases {
        let (status, body) = post(&base_url, payload).await;
        assert_eq!(status, 400);
        assert!(!body.success);
        assert_eq!(body.message, expected);
    }
}

#[tokio::test]
async fn test_backend_rejects_non_json_body() {
    let base_url = spawn_backend(1.0).await;
    let response = reqwest::Client::new()
        .post(format!("{base_url}/api/mpesa"))
        .body("not json")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn test_health_reports_missing_credentials() {
    let base_url = spawn_backend(1.0).await;
    let body: serde_json::Value = reqwest::get(format!("{base_url}/health"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(
        body,
        json!({ "status": "ok", "provider_credentials": false })
    );
}

#[tokio::test]
async fn test_http_gateway_round_trip_success() {
    let base_url = spawn_backend(1.0).await;
    let gateway = HttpGateway::new(&base_url, Duration::from_secs(5)).unwrap();
    let request = TipRequest::validate("50", "+254112345678", RecipientId::new("creator_123"))
        .unwrap();

    assert_eq!(
        gateway.request_payment(&request).await,
        GatewayResult::success(SUCCESS_MESSAGE)
    );
}

#[tokio::test]
async fn test_session_over_http_classifies_failures() {
    let base_url = spawn_backend(0.0).await;
    let gateway = Arc::new(HttpGateway::new(&base_url, Duration::from_secs(5)).unwrap());
    let session = TippingSession::new(
        gateway,
        RecipientId::new("creator_123"),
        SessionSettings::default(),
    );
    session.set_phone("0712345678").await;
    session.submit().await;

    let SubmissionState::Failed(message) = session.confirm().await else {
        panic!("expected failure");
    };
    let snapshot = session.snapshot().await;
    let (expected_kind, _) = FAILURES
        .iter()
        .find(|(_, m)| *m == message)
        .copied()
        .unwrap();

    assert_eq!(snapshot.last_failure, Some(expected_kind));
    assert_eq!(
        snapshot.field_errors.phone.is_some(),
        expected_kind == FailureKind::PhoneUnreachable
    );
}
