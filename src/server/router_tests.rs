//! Router tests
//!
//! Drive the full router with `oneshot` requests: token issuance with and
//! without credentials, voice webhook routing, call history.

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use chrono::{Duration, Utc};
use std::sync::Arc;
use tower::ServiceExt;

use super::config::AppConfig;
use super::history::CallHistoryService;
use super::token::decode_token;
use super::twilio::{CallFilter, CallLogSource, TwilioError};
use super::{create_router, AppState};
use crate::models::{CallHistoryResponse, CallRecord, ErrorResponse, TokenResponse};

fn full_config() -> AppConfig {
    let vars = [
        ("TWILIO_ACCOUNT_SID", "AC0123"),
        ("TWILIO_AUTH_TOKEN", "auth"),
        ("TWILIO_API_KEY", "SK0123"),
        ("TWILIO_API_SECRET", "api-secret"),
        ("TWILIO_APPLICATION_SID", "AP0123"),
        ("TWILIO_PHONE_NUMBER", "+81312345678"),
    ];
    AppConfig::from_lookup(|name| {
        vars.iter()
            .find(|(k, _)| *k == name)
            .map(|(_, v)| v.to_string())
    })
    .unwrap()
}

fn app(config: AppConfig) -> Router {
    create_router(AppState::from_config(config))
}

async fn body_string(response: axum::response::Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn voice_request(form: &str) -> Request<Body> {
    Request::post("/api/voice")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(form.to_string()))
        .unwrap()
}

struct StaticCallLog {
    calls: Vec<CallRecord>,
    fail: bool,
}

#[async_trait]
impl CallLogSource for StaticCallLog {
    async fn list_calls(&self, filter: &CallFilter) -> Result<Vec<CallRecord>, TwilioError> {
        if self.fail {
            return Err(TwilioError::Api {
                status: 500,
                message: "upstream".to_string(),
            });
        }
        // Outbound calls answer the `From` query, inbound ones the `To` query
        Ok(self
            .calls
            .iter()
            .filter(|c| match (&filter.from, &filter.to) {
                (Some(from), _) => &c.from == from,
                (_, Some(to)) => &c.to == to,
                _ => true,
            })
            .cloned()
            .collect())
    }
}

fn history_app(log: StaticCallLog) -> Router {
    let config = full_config();
    let history = CallHistoryService::new(
        Arc::new(log),
        "+81312345678".to_string(),
        config.country_code.clone(),
    );
    let mut state = AppState::from_config(config);
    state.history = Some(history);
    create_router(state)
}

fn logged_call(sid: &str, from: &str, to: &str, minutes_ago: i64) -> CallRecord {
    let start = Utc::now() - Duration::minutes(minutes_ago);
    CallRecord {
        sid: sid.to_string(),
        from: from.to_string(),
        to: to.to_string(),
        direction: "inbound".to_string(),
        status: "completed".to_string(),
        duration: 12,
        start_time: start,
        end_time: Some(start + Duration::seconds(12)),
        price: Some("-0.01".to_string()),
        price_unit: Some("USD".to_string()),
    }
}

#[tokio::test]
async fn test_health_check() {
    let response = app(AppConfig::default())
        .oneshot(Request::get("/api/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "OK");
}

#[tokio::test]
async fn test_token_with_credentials() {
    let response = app(full_config())
        .oneshot(Request::get("/api/token").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: TokenResponse = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(body.identity, "softphone-user");
    assert_eq!(body.caller_number.as_deref(), Some("+81312345678"));

    let claims = decode_token(&body.token, "api-secret").unwrap();
    assert_eq!(claims.grants.identity, "softphone-user");
    assert_eq!(claims.grants.voice.outgoing.application_sid, "AP0123");
}

#[tokio::test]
async fn test_token_without_caller_number_omits_it() {
    let mut config = full_config();
    config.twilio.phone_number = None;

    let response = app(config)
        .oneshot(Request::get("/api/token").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_string(response).await;
    assert!(!body.contains("callerNumber"));
    let body: TokenResponse = serde_json::from_str(&body).unwrap();
    assert_eq!(body.caller_number, None);
}

#[tokio::test]
async fn test_token_without_credentials_fails_closed() {
    let mut config = full_config();
    config.twilio.api_secret = None;

    let response = app(config)
        .oneshot(Request::get("/api/token").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: ErrorResponse = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(body.error, "Missing Twilio configuration");
}

#[tokio::test]
async fn test_voice_browser_call_dials_number() {
    let response = app(full_config())
        .oneshot(voice_request(
            "CallSid=CA1&From=client%3Asoftphone-user&To=%2B819012345678&Direction=inbound",
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "text/xml");
    let xml = body_string(response).await;
    assert!(xml.contains(r#"callerId="+81312345678""#));
    assert!(xml.contains("<Number>+819012345678</Number>"));
}

#[tokio::test]
async fn test_voice_inbound_bridges_to_client_even_unregistered() {
    // Nothing has registered a browser device here
    let response = app(full_config())
        .oneshot(voice_request(
            "CallSid=CA2&From=%2B819087654321&To=%2B81312345678&Direction=inbound",
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let xml = body_string(response).await;
    assert!(xml.contains("<Client>softphone-user</Client>"));
}

#[tokio::test]
async fn test_voice_without_caller_id_refuses_outbound() {
    let mut config = full_config();
    config.twilio.phone_number = None;

    let response = app(config)
        .oneshot(voice_request("From=client%3Asoftphone-user&To=%2B819012345678"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let xml = body_string(response).await;
    assert!(!xml.contains("<Dial"));
    assert!(xml.contains("Outbound calling is not configured"));
}

#[tokio::test]
async fn test_voice_malformed_request_speaks_error() {
    let request = Request::post("/api/voice")
        .body(Body::from("{\"From\": 1}"))
        .unwrap();

    let response = app(full_config()).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let xml = body_string(response).await;
    assert!(xml.contains("<Say>An error occurred</Say>"));
}

#[tokio::test]
async fn test_calls_merged_and_localized() {
    let log = StaticCallLog {
        calls: vec![
            logged_call("CA-out", "+81312345678", "+819011112222", 90),
            logged_call("CA-in", "+819033334444", "+81312345678", 10),
        ],
        fail: false,
    };

    let response = history_app(log)
        .oneshot(Request::get("/api/calls").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: CallHistoryResponse = serde_json::from_str(&body_string(response).await).unwrap();
    let sids: Vec<_> = body.calls.iter().map(|c| c.sid.as_str()).collect();
    assert_eq!(sids, vec!["CA-in", "CA-out"]);
    assert_eq!(body.calls[0].from, "09033334444");
    assert_eq!(body.calls[1].to, "09011112222");
}

#[tokio::test]
async fn test_calls_provider_error() {
    let response = history_app(StaticCallLog { calls: vec![], fail: true })
        .oneshot(Request::get("/api/calls").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: ErrorResponse = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(body.error, "Failed to fetch call logs");
}

#[tokio::test]
async fn test_calls_without_credentials_fails_closed() {
    let response = app(AppConfig::default())
        .oneshot(Request::get("/api/calls").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: ErrorResponse = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(body.error, "Failed to fetch call logs");
}
