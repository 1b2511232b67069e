use std::path::PathBuf;
use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, Utc};

use crate::config::DocumentFormat;
use crate::error::IntakeError;
use crate::sanitize;

static LAST_ID_MILLIS: AtomicI64 = AtomicI64::new(0);

/// Returns a `job-<millis>` id that is strictly greater than every id handed
/// out before it in this process.
fn next_job_id(now: DateTime<Utc>) -> String {
    let now_ms = now.timestamp_millis();
    let previous = LAST_ID_MILLIS
        .fetch_update(Ordering::AcqRel, Ordering::Acquire, |last| {
            Some(now_ms.max(last + 1))
        })
        .unwrap_or(now_ms);
    format!("job-{}", now_ms.max(previous + 1))
}

/// A single document on its way to the printer.
///
/// Built once at enqueue time and never mutated; outcomes live in the
/// history ledger.
#[derive(Debug, Clone)]
pub struct Job {
    pub id: String,
    /// Sanitized client filename; safe to join onto a directory.
    pub original_filename: String,
    /// Persisted upload. The worker that dequeues the job removes it.
    pub stored_path: PathBuf,
    pub client: String,
    pub received_at: DateTime<Utc>,
    pub format: DocumentFormat,
}

impl Job {
    /// Builds a job, re-validating the filename instead of trusting the caller.
    pub fn new(
        original_filename: &str,
        stored_path: PathBuf,
        client: &str,
        received_at: DateTime<Utc>,
    ) -> Result<Self, IntakeError> {
        let filename = sanitize::secure_filename(original_filename);
        if filename.is_empty() {
            return Err(IntakeError::EmptyFilename);
        }

        let format =
            DocumentFormat::from_filename(&filename).ok_or_else(|| IntakeError::UnsupportedFormat {
                extension: filename
                    .rsplit_once('.')
                    .map(|(_, ext)| ext.to_lowercase())
                    .unwrap_or_default(),
                allowed: DocumentFormat::allowed_list(),
            })?;

        Ok(Self {
            id: next_job_id(Utc::now()),
            original_filename: filename,
            stored_path,
            client: client.to_string(),
            received_at,
            format,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(name: &str) -> Result<Job, IntakeError> {
        Job::new(name, PathBuf::from("/tmp/upload"), "10.0.0.7", Utc::now())
    }

    #[test]
    fn test_job_new() {
        let job = job("Report Q3.DOCX").unwrap();
        assert!(job.id.starts_with("job-"));
        assert_eq!(job.original_filename, "Report_Q3.DOCX");
        assert_eq!(job.format, DocumentFormat::Docx);
        assert_eq!(job.client, "10.0.0.7");
    }

    #[test]
    fn test_job_rejects_unsupported_format() {
        let err = job("notes.txt").unwrap_err();
        match err {
            IntakeError::UnsupportedFormat { extension, allowed } => {
                assert_eq!(extension, "txt");
                assert_eq!(allowed, "docx, pdf, pptx, xlsx");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_job_rejects_empty_name() {
        assert!(matches!(job("../.."), Err(IntakeError::EmptyFilename)));
        assert!(matches!(job(""), Err(IntakeError::EmptyFilename)));
    }

    #[test]
    fn test_job_sanitizes_traversal() {
        let job = job("../../etc/cron.d/evil.pdf").unwrap();
        assert_eq!(job.original_filename, "etc_cron.d_evil.pdf");
        assert_eq!(job.format, DocumentFormat::Pdf);
    }

    #[test]
    fn test_job_ids_strictly_increase() {
        let now = Utc::now();
        let ids: Vec<i64> = (0..50)
            .map(|_| {
                next_job_id(now)
                    .trim_start_matches("job-")
                    .parse::<i64>()
                    .unwrap()
            })
            .collect();
        assert!(ids.windows(2).all(|w| w[0] < w[1]));
    }
}
