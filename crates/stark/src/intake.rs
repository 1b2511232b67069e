//! Ingestion side of the queue: validates, persists and enqueues uploads.

use std::fs::File;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::{info, warn};

use crate::config::DocumentFormat;
use crate::error::{IntakeError, StorageError};
use crate::history::{HistoryEvent, HistoryLedger};
use crate::sanitize;
use crate::worker::job::Job;
use crate::worker::queue::JobQueue;

/// Accepts documents for printing.
///
/// Holds the same queue and ledger as the worker pool; both are handed in by
/// the owner rather than looked up globally.
pub struct IngestionGate {
    upload_directory: PathBuf,
    max_file_bytes: u64,
    queue: Arc<JobQueue>,
    ledger: Arc<HistoryLedger>,
}

impl IngestionGate {
    pub fn new(
        upload_directory: impl Into<PathBuf>,
        max_file_size_mb: u64,
        queue: Arc<JobQueue>,
        ledger: Arc<HistoryLedger>,
    ) -> Self {
        Self {
            upload_directory: upload_directory.into(),
            max_file_bytes: max_file_size_mb.saturating_mul(1024 * 1024),
            queue,
            ledger,
        }
    }

    pub fn upload_directory(&self) -> &Path {
        &self.upload_directory
    }

    /// Persists `content` under a unique name in the upload directory and
    /// enqueues it. On any failure nothing is left behind on disk.
    pub fn accept<R: Read>(
        &self,
        filename: &str,
        client: &str,
        content: R,
    ) -> Result<String, IntakeError> {
        let filename = sanitize::secure_filename(filename);
        if filename.is_empty() {
            return Err(IntakeError::EmptyFilename);
        }
        if DocumentFormat::from_filename(&filename).is_none() {
            return Err(IntakeError::UnsupportedFormat {
                extension: filename
                    .rsplit_once('.')
                    .map(|(_, ext)| ext.to_lowercase())
                    .unwrap_or_default(),
                allowed: DocumentFormat::allowed_list(),
            });
        }

        let received_at = Utc::now();
        let stored_path = self.persist(&filename, received_at, content)?;

        self.enqueue(&filename, stored_path.clone(), client, received_at)
            .inspect_err(|_| remove_quietly(&stored_path))
    }

    /// Enqueues an already persisted upload and returns its job id.
    ///
    /// From here on the pipeline owns `stored_path` and deletes it once the
    /// job is finished. If the job is rejected the file stays with the
    /// caller.
    pub fn enqueue(
        &self,
        original_filename: &str,
        stored_path: PathBuf,
        client: &str,
        received_at: DateTime<Utc>,
    ) -> Result<String, IntakeError> {
        let job = Job::new(original_filename, stored_path, client, received_at)?;
        let job_id = job.id.clone();
        let filename = job.original_filename.clone();

        self.queue
            .enqueue_with(job, |job| self.ledger.append(HistoryEvent::queued(job)))?;

        info!("Queued job {} from {} -> {}", job_id, client, filename);
        Ok(job_id)
    }

    fn persist<R: Read>(
        &self,
        filename: &str,
        received_at: DateTime<Utc>,
        content: R,
    ) -> Result<PathBuf, IntakeError> {
        // The millisecond prefix keeps concurrent uploads of the same name
        // apart; create_new catches the rare collision that remains.
        let mut stamp = received_at.timestamp_millis();
        let (path, mut file) = loop {
            let candidate = self
                .upload_directory
                .join(format!("{}_{}", stamp, filename));
            match File::options().write(true).create_new(true).open(&candidate) {
                Ok(file) => break (candidate, file),
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => stamp += 1,
                Err(source) => {
                    return Err(StorageError::WriteFile {
                        path: candidate,
                        source,
                    }
                    .into())
                }
            }
        };

        // Read one byte past the limit to tell "exactly at" from "over".
        let mut limited = content.take(self.max_file_bytes.saturating_add(1));
        let written = io::copy(&mut limited, &mut file).and_then(|n| file.flush().map(|_| n));

        match written {
            Ok(n) if n > self.max_file_bytes => {
                drop(file);
                remove_quietly(&path);
                Err(IntakeError::TooLarge {
                    limit_mb: self.max_file_bytes / (1024 * 1024),
                })
            }
            Ok(_) => Ok(path),
            Err(source) => {
                drop(file);
                remove_quietly(&path);
                Err(StorageError::WriteFile { path, source }.into())
            }
        }
    }
}

fn remove_quietly(path: &Path) {
    if let Err(e) = std::fs::remove_file(path) {
        warn!("Failed to remove rejected upload {}: {}", path.display(), e);
    }
}
