//! Test harness for isolated test execution.
//!
//! Each `TestHarness` owns a temporary directory holding the upload and work
//! directories of one print service, plus a log file the scripted spooler
//! writes printed file names to.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use tempfile::TempDir;

use stark::config::Config;
use stark::{JobStatus, PrintService};

use super::builders::{spool_to_log, ConfigBuilder};

pub struct TestHarness {
    temp_dir: TempDir,
    pub upload_dir: PathBuf,
    pub work_dir: PathBuf,
    /// One line per document the spooler accepted, in print order.
    pub print_log: PathBuf,
}

impl TestHarness {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base = temp_dir.path();

        let upload_dir = base.join("uploads");
        let work_dir = base.join("work");
        let print_log = base.join("printed.log");

        Self {
            temp_dir,
            upload_dir,
            work_dir,
            print_log,
        }
    }

    /// Config whose spooler records every print in `print_log`.
    pub fn config(&self) -> ConfigBuilder {
        ConfigBuilder::new(&self.upload_dir, &self.work_dir)
            .spooler_script(&spool_to_log(&self.print_log))
    }

    pub fn start(&self, config: &Config) -> PrintService {
        PrintService::start(config).expect("Failed to start print service")
    }

    /// Submits `body` as `filename` and returns the job id.
    pub fn submit(&self, service: &PrintService, filename: &str, body: &[u8]) -> String {
        service
            .gate()
            .accept(filename, "10.0.0.5", body)
            .unwrap_or_else(|e| panic!("{filename} was rejected: {e}"))
    }

    pub fn printed(&self) -> Vec<String> {
        match std::fs::read_to_string(&self.print_log) {
            Ok(log) => log.lines().map(str::to_string).collect(),
            Err(_) => Vec::new(),
        }
    }

    pub fn uploads_left(&self) -> usize {
        count_entries(&self.upload_dir)
    }

    pub fn scratch_left(&self) -> usize {
        count_entries(&self.work_dir)
    }

    pub fn temp_path(&self) -> &Path {
        self.temp_dir.path()
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

fn count_entries(dir: &Path) -> usize {
    std::fs::read_dir(dir).map(|d| d.count()).unwrap_or(0)
}

/// Statuses recorded for one job, oldest first.
pub fn statuses(events: &[stark::HistoryEvent], job_id: &str) -> Vec<JobStatus> {
    events
        .iter()
        .filter(|e| e.job_id == job_id)
        .map(|e| e.status)
        .collect()
}
