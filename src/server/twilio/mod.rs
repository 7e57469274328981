//! Twilio REST API client

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize};
use thiserror::Error;

use crate::models::CallRecord;
use crate::server::config::RestCredentials;

#[derive(Error, Debug)]
pub enum TwilioError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },
    #[error("Invalid call record {sid}: {reason}")]
    InvalidRecord { sid: String, reason: String },
}

/// Which calls to list
#[derive(Debug, Clone, PartialEq)]
pub struct CallFilter {
    pub from: Option<String>,
    pub to: Option<String>,
    pub started_after: DateTime<Utc>,
    pub page_size: u32,
}

impl CallFilter {
    pub fn query(&self) -> Vec<(&'static str, String)> {
        let mut query = vec![
            (
                "StartTime>",
                self.started_after.to_rfc3339_opts(SecondsFormat::Secs, true),
            ),
            ("PageSize", self.page_size.to_string()),
        ];
        if let Some(from) = &self.from {
            query.push(("From", from.clone()));
        }
        if let Some(to) = &self.to {
            query.push(("To", to.clone()));
        }
        query
    }
}

/// Source of call log entries
#[async_trait]
pub trait CallLogSource: Send + Sync {
    async fn list_calls(&self, filter: &CallFilter) -> Result<Vec<CallRecord>, TwilioError>;
}

#[derive(Clone)]
pub struct TwilioClient {
    client: Client,
    account_sid: String,
    auth_token: String,
    base_url: String,
}

impl TwilioClient {
    pub fn new(credentials: &RestCredentials, base_url: &str) -> Self {
        Self {
            client: Client::new(),
            account_sid: credentials.account_sid.clone(),
            auth_token: credentials.auth_token.clone(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn get<R: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&'static str, String)],
    ) -> Result<R, TwilioError> {
        let response = self
            .client
            .get(format!("{}/Accounts/{}{}", self.base_url, self.account_sid, path))
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .query(query)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(TwilioError::Api {
                status: status.as_u16(),
                message: error_text,
            });
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl CallLogSource for TwilioClient {
    async fn list_calls(&self, filter: &CallFilter) -> Result<Vec<CallRecord>, TwilioError> {
        let page: CallPage = self.get("/Calls.json", &filter.query()).await?;
        page.calls.into_iter().map(TwilioCall::into_record).collect()
    }
}

// Response types

#[derive(Deserialize)]
struct CallPage {
    calls: Vec<TwilioCall>,
}

/// A call resource as the API returns it
#[derive(Debug, Deserialize)]
pub struct TwilioCall {
    pub sid: String,
    #[serde(default)]
    pub from: String,
    #[serde(default)]
    pub to: String,
    #[serde(default)]
    pub direction: String,
    #[serde(default)]
    pub status: String,
    pub duration: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub date_created: Option<String>,
    pub price: Option<String>,
    pub price_unit: Option<String>,
}

impl TwilioCall {
    /// Convert to a [`CallRecord`]; timestamps come as RFC 2822 strings.
    pub fn into_record(self) -> Result<CallRecord, TwilioError> {
        let invalid = |reason: String| TwilioError::InvalidRecord {
            sid: self.sid.clone(),
            reason,
        };

        // Queued calls have no start time yet
        let start = self
            .start_time
            .as_deref()
            .or(self.date_created.as_deref())
            .ok_or_else(|| invalid("missing start time".to_string()))?;
        let start_time = parse_timestamp(start).map_err(|e| invalid(e))?;

        let end_time = match self.end_time.as_deref() {
            Some(end) => Some(parse_timestamp(end).map_err(|e| invalid(e))?),
            None => None,
        };

        let duration = match self.duration.as_deref() {
            Some(d) => d
                .parse::<u32>()
                .map_err(|_| invalid(format!("bad duration {:?}", d)))?,
            None => 0,
        };

        Ok(CallRecord {
            sid: self.sid,
            from: self.from,
            to: self.to,
            direction: self.direction,
            status: self.status,
            duration,
            start_time,
            end_time,
            price: self.price,
            price_unit: self.price_unit,
        })
    }
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc2822(value)
        .or_else(|_| DateTime::parse_from_rfc3339(value))
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| format!("bad timestamp {:?}: {}", value, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn api_call() -> TwilioCall {
        serde_json::from_value(serde_json::json!({
            "sid": "CA42",
            "from": "+81312345678",
            "to": "+819012345678",
            "direction": "outbound-dial",
            "status": "completed",
            "duration": "61",
            "start_time": "Thu, 15 Oct 2026 09:30:00 +0000",
            "end_time": "Thu, 15 Oct 2026 09:31:01 +0000",
            "date_created": "Thu, 15 Oct 2026 09:29:58 +0000",
            "price": "-0.05000",
            "price_unit": "USD",
            "uri": "/2010-04-01/Accounts/AC1/Calls/CA42.json"
        }))
        .unwrap()
    }

    #[test]
    fn test_into_record_parses_provider_fields() {
        let record = api_call().into_record().unwrap();
        assert_eq!(record.duration, 61);
        assert_eq!(record.start_time, Utc.with_ymd_and_hms(2026, 10, 15, 9, 30, 0).unwrap());
        assert_eq!(record.end_time, Some(Utc.with_ymd_and_hms(2026, 10, 15, 9, 31, 1).unwrap()));
        assert_eq!(record.price_unit.as_deref(), Some("USD"));
    }

    #[test]
    fn test_queued_call_falls_back_to_creation_time() {
        let mut call = api_call();
        call.start_time = None;
        call.end_time = None;
        call.duration = None;
        let record = call.into_record().unwrap();
        assert_eq!(record.start_time, Utc.with_ymd_and_hms(2026, 10, 15, 9, 29, 58).unwrap());
        assert_eq!(record.duration, 0);
    }

    #[test]
    fn test_bad_duration_is_rejected() {
        let mut call = api_call();
        call.duration = Some("soon".to_string());
        assert!(matches!(call.into_record(), Err(TwilioError::InvalidRecord { .. })));
    }

    #[test]
    fn test_filter_query() {
        let filter = CallFilter {
            from: None,
            to: Some("+81312345678".to_string()),
            started_after: Utc.with_ymd_and_hms(2026, 10, 15, 0, 0, 0).unwrap(),
            page_size: 50,
        };
        let query = filter.query();
        assert!(query.contains(&("StartTime>", "2026-10-15T00:00:00Z".to_string())));
        assert!(query.contains(&("To", "+81312345678".to_string())));
        assert!(!query.iter().any(|(k, _)| *k == "From"));
    }
}
