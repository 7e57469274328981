use crate::api::{api_client, ApiError};
use crate::models::CallHistoryResponse;

/// Recent calls, newest first
pub async fn get_call_history() -> Result<CallHistoryResponse, ApiError> {
    api_client().get("/api/calls").await
}
