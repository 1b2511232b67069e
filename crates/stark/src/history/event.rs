use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::worker::job::Job;

/// Lifecycle status recorded for a job.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Queued,
    Processing,
    ConversionFailed,
    PrintFailed,
    Printed,
}

impl JobStatus {
    /// Whether this status ends a job's lifecycle.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::ConversionFailed | JobStatus::PrintFailed | JobStatus::Printed
        )
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobStatus::Queued => write!(f, "queued"),
            JobStatus::Processing => write!(f, "processing"),
            JobStatus::ConversionFailed => write!(f, "conversion_failed"),
            JobStatus::PrintFailed => write!(f, "print_failed"),
            JobStatus::Printed => write!(f, "printed"),
        }
    }
}

/// One immutable entry in the history ledger.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HistoryEvent {
    pub timestamp: DateTime<Utc>,
    pub job_id: String,
    pub filename: String,
    pub status: JobStatus,
    /// Originating client (queued and processing events).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client: Option<String>,
    /// Diagnostic text (failure events).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Spooler acknowledgement (printed events).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub printer_response: Option<String>,
}

impl HistoryEvent {
    fn base(job: &Job, status: JobStatus, timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            job_id: job.id.clone(),
            filename: job.original_filename.clone(),
            status,
            client: None,
            error: None,
            printer_response: None,
        }
    }

    /// Stamped with the job's acceptance time rather than the append time.
    pub fn queued(job: &Job) -> Self {
        Self {
            client: Some(job.client.clone()),
            ..Self::base(job, JobStatus::Queued, job.received_at)
        }
    }

    pub fn processing(job: &Job) -> Self {
        Self {
            client: Some(job.client.clone()),
            ..Self::base(job, JobStatus::Processing, Utc::now())
        }
    }

    pub fn conversion_failed(job: &Job, error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::base(job, JobStatus::ConversionFailed, Utc::now())
        }
    }

    pub fn print_failed(job: &Job, error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::base(job, JobStatus::PrintFailed, Utc::now())
        }
    }

    pub fn printed(job: &Job, printer_response: impl Into<String>) -> Self {
        Self {
            printer_response: Some(printer_response.into()),
            ..Self::base(job, JobStatus::Printed, Utc::now())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn job() -> Job {
        Job::new(
            "memo.docx",
            PathBuf::from("/uploads/1_memo.docx"),
            "192.168.1.20",
            Utc::now(),
        )
        .unwrap()
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(!JobStatus::Queued.is_terminal());
        assert!(!JobStatus::Processing.is_terminal());
        assert!(JobStatus::ConversionFailed.is_terminal());
        assert!(JobStatus::PrintFailed.is_terminal());
        assert!(JobStatus::Printed.is_terminal());
    }

    #[test]
    fn test_queued_event_carries_client_and_received_at() {
        let job = job();
        let event = HistoryEvent::queued(&job);
        assert_eq!(event.status, JobStatus::Queued);
        assert_eq!(event.timestamp, job.received_at);
        assert_eq!(event.client.as_deref(), Some("192.168.1.20"));
        assert!(event.error.is_none());
    }

    #[test]
    fn test_serialized_shape() {
        let job = job();
        let event = HistoryEvent::print_failed(&job, "lp: printer offline");
        let value = serde_json::to_value(&event).unwrap();

        assert_eq!(value["status"], "print_failed");
        assert_eq!(value["job_id"], job.id.as_str());
        assert_eq!(value["filename"], "memo.docx");
        assert_eq!(value["error"], "lp: printer offline");
        assert!(value.get("client").is_none());
        assert!(value.get("printer_response").is_none());
    }

    #[test]
    fn test_status_display_matches_serde() {
        for status in [
            JobStatus::Queued,
            JobStatus::Processing,
            JobStatus::ConversionFailed,
            JobStatus::PrintFailed,
            JobStatus::Printed,
        ] {
            let json = serde_json::to_value(status).unwrap();
            assert_eq!(json, status.to_string());
        }
    }
}
