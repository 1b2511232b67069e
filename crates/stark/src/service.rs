//! Supervisor that owns the queue, ledger and workers for one process.

use std::path::Path;
use std::sync::Arc;

use log::info;
use serde::Serialize;

use crate::config::{validate_config, Config};
use crate::error::{Result, StorageError};
use crate::history::{HistoryEvent, HistoryLedger};
use crate::intake::IngestionGate;
use crate::pipeline::{Pipeline, PipelineConfig};
use crate::worker::pool::WorkerPool;
use crate::worker::queue::JobQueue;

/// Answer to a health probe.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct HealthReport {
    pub status: &'static str,
    pub queue_size: usize,
    pub workers: usize,
    pub history_len: usize,
}

/// Built once at startup; torn down with [`PrintService::shutdown`].
pub struct PrintService {
    queue: Arc<JobQueue>,
    ledger: Arc<HistoryLedger>,
    gate: IngestionGate,
    pool: WorkerPool,
    history_limit: usize,
}

impl PrintService {
    /// Starts the service with the external converter and spooler from config.
    pub fn start(config: &Config) -> Result<Self> {
        let pipeline = Pipeline::from_config(Arc::new(PipelineConfig::from_config(config)));
        Self::with_pipeline(config, pipeline)
    }

    /// Starts the service around a caller-built pipeline.
    pub fn with_pipeline(config: &Config, pipeline: Pipeline) -> Result<Self> {
        validate_config(config)?;
        ensure_directory(Path::new(&config.upload_directory))?;
        ensure_directory(pipeline.work_directory())?;

        let queue = Arc::new(JobQueue::new());
        let ledger = Arc::new(HistoryLedger::new(config.history.capacity));

        let gate = IngestionGate::new(
            &config.upload_directory,
            config.max_file_size_mb,
            Arc::clone(&queue),
            Arc::clone(&ledger),
        );
        let pool = WorkerPool::start(
            Arc::new(pipeline),
            Arc::clone(&queue),
            Arc::clone(&ledger),
            config.worker_count,
        )?;

        info!(
            "Print service ready: {} worker(s), uploads in {}",
            config.worker_count, config.upload_directory
        );

        Ok(Self {
            queue,
            ledger,
            gate,
            pool,
            history_limit: config.history.query_limit,
        })
    }

    pub fn gate(&self) -> &IngestionGate {
        &self.gate
    }

    pub fn ledger(&self) -> &Arc<HistoryLedger> {
        &self.ledger
    }

    /// Never blocks; the queue size may already be stale when read.
    pub fn health(&self) -> HealthReport {
        HealthReport {
            status: if self.queue.is_closed() {
                "shutting_down"
            } else {
                "ok"
            },
            queue_size: self.queue.depth(),
            workers: self.pool.worker_count(),
            history_len: self.ledger.len(),
        }
    }

    /// Most recent events, up to the configured query limit.
    pub fn history(&self) -> Vec<HistoryEvent> {
        self.ledger.recent(self.history_limit)
    }

    /// Stops accepting jobs, lets the workers drain what is already queued,
    /// and waits for them to exit.
    pub fn shutdown(self) {
        info!("Shutting down print service...");
        self.pool.shutdown();
        self.pool.wait();
        info!("Print service stopped");
    }
}

fn ensure_directory(path: &Path) -> std::result::Result<(), StorageError> {
    std::fs::create_dir_all(path).map_err(|source| StorageError::CreateDirectory {
        path: path.to_path_buf(),
        source,
    })
}
