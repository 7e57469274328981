use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

/// A call as reported by the provider's call log.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CallRecord {
    pub sid: String,
    pub from: String,
    pub to: String,
    pub direction: String,
    pub status: String,
    pub duration: u32,
    #[serde(rename = "startTime")]
    pub start_time: DateTime<Utc>,
    #[serde(rename = "endTime")]
    pub end_time: Option<DateTime<Utc>>,
    pub price: Option<String>,
    #[serde(rename = "priceUnit")]
    pub price_unit: Option<String>,
}

impl CallRecord {
    /// Check the record against the response schema.
    pub fn validate(&self) -> Result<(), String> {
        if self.sid.trim().is_empty() {
            return Err("call sid is required".to_string());
        }
        if let Some(end) = self.end_time {
            if end < self.start_time {
                return Err(format!("call {} ends before it starts", self.sid));
            }
        }
        Ok(())
    }

    pub fn is_outbound(&self) -> bool {
        self.direction.starts_with("outbound")
    }

    pub fn status(&self) -> CallStatus {
        CallStatus::from(self.status.as_str())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CallHistoryResponse {
    pub calls: Vec<CallRecord>,
}

/// Final status of a logged call
#[derive(Debug, Clone, PartialEq)]
pub enum CallStatus {
    Queued,
    Ringing,
    InProgress,
    Completed,
    Busy,
    NoAnswer,
    Failed,
    Canceled,
    Other(String),
}

impl From<&str> for CallStatus {
    fn from(s: &str) -> Self {
        match s {
            "queued" => CallStatus::Queued,
            "ringing" => CallStatus::Ringing,
            "in-progress" => CallStatus::InProgress,
            "completed" => CallStatus::Completed,
            "busy" => CallStatus::Busy,
            "no-answer" => CallStatus::NoAnswer,
            "failed" => CallStatus::Failed,
            "canceled" => CallStatus::Canceled,
            other => CallStatus::Other(other.to_string()),
        }
    }
}

impl CallStatus {
    pub fn display_name(&self) -> &str {
        match self {
            CallStatus::Queued => "Queued",
            CallStatus::Ringing => "Ringing",
            CallStatus::InProgress => "In Progress",
            CallStatus::Completed => "Completed",
            CallStatus::Busy => "Busy",
            CallStatus::NoAnswer => "No Answer",
            CallStatus::Failed => "Failed",
            CallStatus::Canceled => "Canceled",
            CallStatus::Other(s) => s,
        }
    }

    pub fn color_class(&self) -> &str {
        match self {
            CallStatus::Completed => "text-green-600",
            CallStatus::Busy => "text-yellow-600",
            CallStatus::NoAnswer => "text-gray-600",
            CallStatus::Failed => "text-red-600",
            CallStatus::Canceled => "text-gray-500",
            _ => "text-gray-700",
        }
    }
}

/// Format a call duration for the history list
pub fn format_duration(seconds: u32) -> String {
    if seconds == 0 {
        return "-".to_string();
    }
    format!("{}m {}s", seconds / 60, seconds % 60)
}
