//! Voice webhook: decides where an incoming call leg is bridged to

use axum::{
    extract::{rejection::FormRejection, State},
    Form,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::models::is_phone_number;
use crate::server::twiml::{Dial, DialTarget, VoiceResponse, DIAL_TIMEOUT_SECS};
use crate::server::AppState;

/// Parameters the provider posts with each call
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct VoiceWebhook {
    pub to: Option<String>,
    pub from: Option<String>,
    pub direction: Option<String>,
    pub call_sid: Option<String>,
}

impl VoiceWebhook {
    fn field(value: &Option<String>) -> Option<&str> {
        value.as_deref().map(str::trim).filter(|v| !v.is_empty())
    }

    pub fn to(&self) -> Option<&str> {
        Self::field(&self.to)
    }

    pub fn from(&self) -> Option<&str> {
        Self::field(&self.from)
    }

    pub fn is_inbound(&self) -> bool {
        Self::field(&self.direction)
            .map(|d| d.eq_ignore_ascii_case("inbound"))
            .unwrap_or(false)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// The browser placed a call without a destination
    MissingDestination,
    /// Caller or direction does not match any route
    Unroutable,
    /// The request could not be decoded
    Malformed,
    /// No caller ID is configured for outbound calls
    NotConfigured,
}

impl RejectReason {
    pub fn message(&self) -> &'static str {
        match self {
            RejectReason::MissingDestination => "No phone number provided",
            RejectReason::Unroutable => "This call cannot be connected",
            RejectReason::Malformed => "An error occurred",
            RejectReason::NotConfigured => "Outbound calling is not configured",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RouteDecision {
    /// Bridge the browser's call out to a PSTN number
    DialNumber { to: String },
    /// Bridge an external caller to the browser client
    DialClient { identity: String },
    Reject(RejectReason),
}

/// Decide the bridge target for a call.
///
/// Registration of the browser client is not checked; an inbound call is
/// routed to the identity whether or not anyone is listening.
pub fn route_call(params: &VoiceWebhook, identity: &str) -> RouteDecision {
    let browser = format!("client:{}", identity);

    match params.from() {
        Some(from) if from == browser => match params.to() {
            Some(to) => RouteDecision::DialNumber { to: to.to_string() },
            None => RouteDecision::Reject(RejectReason::MissingDestination),
        },
        Some(from) if params.is_inbound() && is_phone_number(from) => RouteDecision::DialClient {
            identity: identity.to_string(),
        },
        _ => RouteDecision::Reject(RejectReason::Unroutable),
    }
}

/// Render a routing decision as TwiML
pub fn render(decision: &RouteDecision, caller_id: Option<&str>) -> VoiceResponse {
    match decision {
        RouteDecision::DialNumber { to } => match caller_id {
            Some(caller_id) => VoiceResponse::new().dial(Dial {
                target: DialTarget::Number(to.clone()),
                caller_id: Some(caller_id.to_string()),
                timeout: DIAL_TIMEOUT_SECS,
                answer_on_bridge: true,
            }),
            None => VoiceResponse::new().say(RejectReason::NotConfigured.message()),
        },
        RouteDecision::DialClient { identity } => VoiceResponse::new().dial(Dial {
            target: DialTarget::Client(identity.clone()),
            caller_id: None,
            timeout: DIAL_TIMEOUT_SECS,
            answer_on_bridge: false,
        }),
        RouteDecision::Reject(reason) => VoiceResponse::new().say(reason.message()),
    }
}

/// POST /api/voice
///
/// Always answers 200 with valid markup so the provider never fails open.
#[tracing::instrument(skip_all)]
pub async fn handle_voice(
    State(state): State<Arc<AppState>>,
    form: Result<Form<VoiceWebhook>, FormRejection>,
) -> VoiceResponse {
    let params = match form {
        Ok(Form(params)) => params,
        Err(e) => {
            tracing::warn!("Malformed voice webhook: {}", e);
            return render(&RouteDecision::Reject(RejectReason::Malformed), None);
        }
    };

    let decision = route_call(&params, &state.config.identity);
    tracing::info!(
        call_sid = params.call_sid.as_deref().unwrap_or("-"),
        direction = params.direction.as_deref().unwrap_or("-"),
        "Voice webhook routed: {:?}",
        decision
    );

    if matches!(decision, RouteDecision::DialNumber { .. }) && state.config.twilio.phone_number.is_none() {
        tracing::error!("Outbound call requested but TWILIO_PHONE_NUMBER is not set");
    }

    render(&decision, state.config.twilio.phone_number.as_deref())
}
