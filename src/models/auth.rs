use serde::{Deserialize, Serialize};

/// Access token issued to the browser SDK
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TokenResponse {
    pub token: String,
    pub identity: String,
    /// The line's own number in E.164, when configured
    #[serde(rename = "callerNumber", default, skip_serializing_if = "Option::is_none")]
    pub caller_number: Option<String>,
}

/// Error body returned by the API with a 500 status
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self { error: message.into() }
    }
}
