use crate::api::{api_client, ApiError};
use crate::models::TokenResponse;

/// Fetch an access token for the browser SDK
pub async fn fetch_token() -> Result<TokenResponse, ApiError> {
    let response: TokenResponse = api_client().get("/api/token").await?;
    if response.token.is_empty() {
        return Err(ApiError::Parse("empty token".to_string()));
    }
    Ok(response)
}
