//! Server-side code for the softphone
//!
//! - Access tokens for the browser SDK
//! - Voice webhook (TwiML call routing)
//! - Call history from the Twilio REST API

pub mod config;
pub mod history;
pub mod token;
pub mod twilio;
pub mod twiml;
pub mod voice;

#[cfg(test)]
mod router_tests;

use axum::{
    http::Method,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use config::AppConfig;
use history::CallHistoryService;
use token::TokenIssuer;
use twilio::TwilioClient;

/// Application state shared across all routes
pub struct AppState {
    pub config: AppConfig,
    /// `None` when the token credentials are incomplete
    pub tokens: Option<TokenIssuer>,
    /// `None` when the REST credentials are incomplete
    pub history: Option<CallHistoryService>,
}

impl AppState {
    /// Resolve credential groups once; missing ones disable their endpoint.
    pub fn from_config(config: AppConfig) -> Self {
        let tokens = match config.token_credentials() {
            Ok(credentials) => Some(TokenIssuer::new(
                credentials,
                config.identity.clone(),
                config.token_ttl_secs,
                config.incoming_allow,
            )),
            Err(e) => {
                tracing::warn!("Token endpoint disabled: {}", e);
                None
            }
        };

        let history = match config.rest_credentials() {
            Ok(credentials) => {
                let client = TwilioClient::new(&credentials, &config.twilio.api_base_url);
                Some(CallHistoryService::new(
                    Arc::new(client),
                    credentials.phone_number,
                    config.country_code.clone(),
                ))
            }
            Err(e) => {
                tracing::warn!("Call history endpoint disabled: {}", e);
                None
            }
        };

        Self {
            config,
            tokens,
            history,
        }
    }
}

/// Create the Axum router with all API routes
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/api/health", get(health_check))
        .route("/api/token", get(token::get_token))
        .route("/api/calls", get(history::get_calls))
        .route("/api/voice", post(voice::handle_voice))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(state))
}

// Health check
async fn health_check() -> &'static str {
    "OK"
}

/// Initialize and start the server
pub async fn run_server(config: AppConfig) -> anyhow::Result<()> {
    let port = config.port;
    let state = AppState::from_config(config);

    if state.config.twilio.phone_number.is_none() {
        tracing::warn!("TWILIO_PHONE_NUMBER not set, outbound calls will be refused");
    }

    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;
    tracing::info!("Server running on http://0.0.0.0:{}", port);

    axum::serve(listener, app).await?;

    Ok(())
}
