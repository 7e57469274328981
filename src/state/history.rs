use dioxus::prelude::*;

use crate::api::ApiError;
use crate::components::common::sleep_ms;
use crate::models::CallRecord;

/// Global call history state
pub static HISTORY_STATE: GlobalSignal<HistoryState> = Signal::global(HistoryState::default);

/// Retries after a failed history fetch
const ERROR_RETRY_COUNT: u32 = 2;
const ERROR_RETRY_INTERVAL_MS: u32 = 1000;

#[derive(Clone, Default)]
pub struct HistoryState {
    pub calls: Vec<CallRecord>,
    pub is_loading: bool,
    pub error: Option<String>,
    /// A refresh was requested while a fetch was in flight
    refresh_queued: bool,
}

impl HistoryState {
    /// Claim the fetch slot. Returns false when a fetch is already running;
    /// that fetch then runs once more when it finishes.
    fn begin_refresh(&mut self) -> bool {
        if self.is_loading {
            self.refresh_queued = true;
            return false;
        }
        self.is_loading = true;
        true
    }

    /// Store a fetch result. Returns true when a queued refresh has to run.
    fn finish_refresh(&mut self, result: Result<Vec<CallRecord>, ApiError>) -> bool {
        match result {
            Ok(calls) => {
                self.calls = calls;
                self.error = None;
            }
            Err(e) => {
                tracing::error!("Failed to fetch call history: {}", e);
                self.error = Some("Failed to fetch call history".to_string());
            }
        }

        let again = std::mem::take(&mut self.refresh_queued);
        self.is_loading = again;
        again
    }
}

/// Reload the call history from the server.
///
/// A refresh requested while one is running is queued and performed once
/// the current fetch completes. Failed fetches are retried a couple of
/// times before the error is shown.
pub async fn refresh_history() {
    if !HISTORY_STATE.write().begin_refresh() {
        return;
    }

    loop {
        let result = fetch_with_retry().await;
        if !HISTORY_STATE.write().finish_refresh(result) {
            break;
        }
        tracing::debug!("Running queued call history refresh");
    }
}

async fn fetch_with_retry() -> Result<Vec<CallRecord>, ApiError> {
    let mut attempt = 0;
    loop {
        match crate::api::calls::get_call_history().await {
            Ok(response) => return Ok(response.calls),
            Err(e) if attempt < ERROR_RETRY_COUNT => {
                tracing::warn!("Call history fetch failed (attempt {}): {}", attempt + 1, e);
                attempt += 1;
                sleep_ms(ERROR_RETRY_INTERVAL_MS).await;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn record(sid: &str) -> CallRecord {
        CallRecord {
            sid: sid.to_string(),
            from: "+81312345678".to_string(),
            to: "client:softphone-user".to_string(),
            direction: "inbound".to_string(),
            status: "completed".to_string(),
            duration: 5,
            start_time: Utc::now(),
            end_time: None,
            price: None,
            price_unit: None,
        }
    }

    #[test]
    fn test_single_refresh() {
        let mut state = HistoryState::default();
        assert!(state.begin_refresh());
        assert!(state.is_loading);

        assert!(!state.finish_refresh(Ok(vec![record("CA1")])));
        assert!(!state.is_loading);
        assert_eq!(state.calls.len(), 1);
    }

    #[test]
    fn test_refresh_during_fetch_runs_once_more() {
        let mut state = HistoryState::default();
        assert!(state.begin_refresh());

        // Post-call refresh and a manual click land while the first fetch runs
        assert!(!state.begin_refresh());
        assert!(!state.begin_refresh());

        assert!(state.finish_refresh(Ok(vec![record("CA1")])));
        assert!(state.is_loading);

        assert!(!state.finish_refresh(Ok(vec![record("CA2"), record("CA1")])));
        assert!(!state.is_loading);
        assert_eq!(state.calls[0].sid, "CA2");
    }

    #[test]
    fn test_failed_fetch_keeps_previous_calls() {
        let mut state = HistoryState::default();
        state.begin_refresh();
        state.finish_refresh(Ok(vec![record("CA1")]));

        state.begin_refresh();
        assert!(!state.finish_refresh(Err(ApiError::Network("offline".into()))));
        assert_eq!(state.calls.len(), 1);
        assert_eq!(state.error.as_deref(), Some("Failed to fetch call history"));
    }
}
