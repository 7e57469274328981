//! Recent call history, merged from the outbound and inbound call logs

use axum::{extract::State, http::StatusCode, Json};
use chrono::{DateTime, Duration, Utc};
use std::collections::HashSet;
use std::sync::Arc;

use crate::models::{format_for_display, CallHistoryResponse, CallRecord, ErrorResponse};
use crate::server::twilio::{CallFilter, CallLogSource, TwilioError};
use crate::server::AppState;

/// How far back the history reaches
pub const HISTORY_WINDOW_HOURS: i64 = 24;
/// Calls fetched per direction
pub const HISTORY_PAGE_SIZE: u32 = 50;

pub struct CallHistoryService {
    source: Arc<dyn CallLogSource>,
    phone_number: String,
    country_code: String,
}

impl CallHistoryService {
    pub fn new(source: Arc<dyn CallLogSource>, phone_number: String, country_code: String) -> Self {
        Self {
            source,
            phone_number,
            country_code,
        }
    }

    /// Calls placed from or to the service number in the last day, newest first
    pub async fn recent_calls(&self, now: DateTime<Utc>) -> Result<Vec<CallRecord>, TwilioError> {
        let started_after = now - Duration::hours(HISTORY_WINDOW_HOURS);

        let outbound_filter = CallFilter {
            from: Some(self.phone_number.clone()),
            to: None,
            started_after,
            page_size: HISTORY_PAGE_SIZE,
        };
        let inbound_filter = CallFilter {
            from: None,
            to: Some(self.phone_number.clone()),
            started_after,
            page_size: HISTORY_PAGE_SIZE,
        };

        let (outbound, inbound) = futures::try_join!(
            self.source.list_calls(&outbound_filter),
            self.source.list_calls(&inbound_filter),
        )?;

        tracing::debug!(outbound = outbound.len(), inbound = inbound.len(), "Fetched call logs");

        let calls = merge_calls(outbound, inbound, &self.country_code)
            .into_iter()
            .filter(|c| c.start_time >= started_after)
            .collect::<Vec<_>>();

        for call in &calls {
            call.validate().map_err(|reason| TwilioError::InvalidRecord {
                sid: call.sid.clone(),
                reason,
            })?;
        }

        Ok(calls)
    }
}

/// Merge both directions, drop duplicate sids, localize numbers, sort newest first.
///
/// A call bridged between two legs on the service number shows up in both
/// logs; the first occurrence wins.
pub fn merge_calls(outbound: Vec<CallRecord>, inbound: Vec<CallRecord>, country_code: &str) -> Vec<CallRecord> {
    let mut seen = HashSet::new();
    let mut calls: Vec<CallRecord> = outbound
        .into_iter()
        .chain(inbound)
        .filter(|c| seen.insert(c.sid.clone()))
        .map(|mut c| {
            c.from = format_for_display(&c.from, country_code);
            c.to = format_for_display(&c.to, country_code);
            c
        })
        .collect();

    calls.sort_by(|a, b| b.start_time.cmp(&a.start_time));
    calls
}

/// GET /api/calls
#[tracing::instrument(skip_all)]
pub async fn get_calls(
    State(state): State<Arc<AppState>>,
) -> Result<Json<CallHistoryResponse>, (StatusCode, Json<ErrorResponse>)> {
    let failed = || {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::new("Failed to fetch call logs")),
        )
    };

    let Some(history) = state.history.as_ref() else {
        tracing::error!("Call history requested but Twilio credentials are not configured");
        return Err(failed());
    };

    let calls = history.recent_calls(Utc::now()).await.map_err(|e| {
        tracing::error!("Error fetching call logs: {}", e);
        failed()
    })?;

    tracing::info!(count = calls.len(), "Returning call history");
    Ok(Json(CallHistoryResponse { calls }))
}
