//! Access tokens for the Twilio Voice browser SDK
//!
//! Tokens are HS256 JWTs signed with the API key secret and carry a voice
//! grant for a single identity.

use axum::{extract::State, http::StatusCode, Json};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

use crate::models::{ErrorResponse, TokenResponse};
use crate::server::config::TokenCredentials;
use crate::server::AppState;

/// Content type the provider expects in the JWT header
const TOKEN_CONTENT_TYPE: &str = "twilio-fpa;v=1";

#[derive(Error, Debug)]
pub enum TokenError {
    #[error("Twilio token credentials are not configured")]
    NotConfigured,
    #[error("Failed to sign token: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),
}

impl TokenError {
    /// Message shown to the browser; details stay in the log
    pub fn public_message(&self) -> &'static str {
        match self {
            TokenError::NotConfigured => "Missing Twilio configuration",
            TokenError::Signing(_) => "Failed to generate token",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct AccessTokenClaims {
    pub jti: String,
    pub iss: String,      // api key
    pub sub: String,      // account sid
    pub iat: i64,
    pub nbf: i64,
    pub exp: i64,
    pub grants: Grants,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Grants {
    pub identity: String,
    pub voice: VoiceGrant,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct VoiceGrant {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub incoming: Option<IncomingGrant>,
    pub outgoing: OutgoingGrant,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct IncomingGrant {
    pub allow: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct OutgoingGrant {
    pub application_sid: String,
}

/// Mints tokens for the configured identity
#[derive(Debug, Clone)]
pub struct TokenIssuer {
    credentials: TokenCredentials,
    identity: String,
    ttl_secs: i64,
    incoming_allow: bool,
}

impl TokenIssuer {
    pub fn new(credentials: TokenCredentials, identity: String, ttl_secs: u64, incoming_allow: bool) -> Self {
        Self {
            credentials,
            identity,
            ttl_secs: ttl_secs as i64,
            incoming_allow,
        }
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// Create a token valid from now
    pub fn issue(&self) -> Result<String, TokenError> {
        self.issue_at(chrono::Utc::now().timestamp())
    }

    pub fn issue_at(&self, now: i64) -> Result<String, TokenError> {
        let claims = AccessTokenClaims {
            jti: format!("{}-{}", self.credentials.api_key, now),
            iss: self.credentials.api_key.clone(),
            sub: self.credentials.account_sid.clone(),
            iat: now,
            nbf: now,
            exp: now + self.ttl_secs,
            grants: Grants {
                identity: self.identity.clone(),
                voice: VoiceGrant {
                    incoming: self.incoming_allow.then_some(IncomingGrant { allow: true }),
                    outgoing: OutgoingGrant {
                        application_sid: self.credentials.application_sid.clone(),
                    },
                },
            },
        };

        let mut header = Header::new(Algorithm::HS256);
        header.cty = Some(TOKEN_CONTENT_TYPE.to_string());

        let token = encode(
            &header,
            &claims,
            &EncodingKey::from_secret(self.credentials.api_secret.as_bytes()),
        )?;
        Ok(token)
    }
}

/// Validate a token and extract its claims
#[cfg(test)]
pub fn decode_token(token: &str, secret: &str) -> Result<AccessTokenClaims, jsonwebtoken::errors::Error> {
    let token_data = jsonwebtoken::decode::<AccessTokenClaims>(
        token,
        &jsonwebtoken::DecodingKey::from_secret(secret.as_bytes()),
        &jsonwebtoken::Validation::new(Algorithm::HS256),
    )?;

    Ok(token_data.claims)
}

/// GET /api/token
#[tracing::instrument(skip_all)]
pub async fn get_token(
    State(state): State<Arc<AppState>>,
) -> Result<Json<TokenResponse>, (StatusCode, Json<ErrorResponse>)> {
    let issue = || {
        let issuer = state.tokens.as_ref().ok_or(TokenError::NotConfigured)?;
        let token = issuer.issue()?;
        Ok::<_, TokenError>(TokenResponse {
            token,
            identity: issuer.identity().to_string(),
            caller_number: state.config.twilio.phone_number.clone(),
        })
    };

    match issue() {
        Ok(response) => {
            tracing::info!(identity = %response.identity, "Issued access token");
            Ok(Json(response))
        }
        Err(e) => {
            tracing::error!("Error generating token: {}", e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new(e.public_message())),
            ))
        }
    }
}
