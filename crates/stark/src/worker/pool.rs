use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use log::{debug, error, info, warn};

use crate::error::WorkerError;
use crate::history::{HistoryEvent, HistoryLedger};
use crate::pipeline::{Pipeline, PipelineContext, PipelineError, Stage};
use crate::worker::job::Job;
use crate::worker::queue::{JobQueue, QueueMessage};

/// Fixed set of long-lived worker threads draining a [`JobQueue`].
///
/// With one worker, jobs are printed in exactly the order they were
/// enqueued. With more, each worker still takes jobs in queue order but
/// their completions can interleave; that is a throughput/ordering trade-off
/// chosen in config, not a defect.
pub struct WorkerPool {
    queue: Arc<JobQueue>,
    workers: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawns `worker_count` workers.
    ///
    /// # Panics
    /// Panics if `worker_count` is 0.
    pub fn start(
        pipeline: Arc<Pipeline>,
        queue: Arc<JobQueue>,
        ledger: Arc<HistoryLedger>,
        worker_count: usize,
    ) -> Result<Self, WorkerError> {
        assert!(worker_count > 0, "worker_count must be > 0");

        let mut workers = Vec::with_capacity(worker_count);

        for worker_id in 1..=worker_count {
            let worker_queue = Arc::clone(&queue);
            let worker_ledger = Arc::clone(&ledger);
            let worker_pipeline = Arc::clone(&pipeline);

            let spawned = thread::Builder::new()
                .name(format!("stark-worker-{}", worker_id))
                .spawn(move || {
                    run_worker(worker_id, worker_queue, worker_ledger, worker_pipeline);
                });

            match spawned {
                Ok(handle) => workers.push(handle),
                Err(e) => {
                    // Stop the ones already running before reporting.
                    let started = Self { queue, workers };
                    started.shutdown();
                    started.wait();
                    return Err(WorkerError::SpawnFailed(e.to_string()));
                }
            }
        }

        info!("Started {} workers", worker_count);

        Ok(Self { queue, workers })
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Closes the queue and sends one stop signal per worker. Jobs already
    /// queued are still processed.
    pub fn shutdown(&self) {
        info!("Shutting down worker pool...");
        self.queue.close(self.workers.len());
    }

    /// Waits for every worker to exit.
    pub fn wait(self) {
        for (i, worker) in self.workers.into_iter().enumerate() {
            if let Err(e) = worker.join() {
                error!("Worker {} panicked: {}", i + 1, panic_message(e.as_ref()));
            } else {
                debug!("Worker {} finished", i + 1);
            }
        }

        info!("All workers have stopped");
    }
}

fn run_worker(
    worker_id: usize,
    queue: Arc<JobQueue>,
    ledger: Arc<HistoryLedger>,
    pipeline: Arc<Pipeline>,
) {
    info!("Worker {} started", worker_id);

    loop {
        match queue.dequeue() {
            QueueMessage::Job(job) => process_job(worker_id, &job, &ledger, &pipeline),
            QueueMessage::Shutdown => {
                info!("Worker {} received shutdown signal", worker_id);
                break;
            }
        }
    }

    debug!("Worker {} stopped", worker_id);
}

/// Removes the persisted upload when dropped, whatever happened to the job.
struct InputCleanup {
    path: PathBuf,
}

impl Drop for InputCleanup {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            // Log but don't panic - best effort cleanup
            warn!("Failed to remove upload {}: {}", self.path.display(), e);
        }
    }
}

/// Runs one job end to end and records exactly one terminal event for it.
fn process_job(worker_id: usize, job: &Job, ledger: &HistoryLedger, pipeline: &Pipeline) {
    let _cleanup = InputCleanup {
        path: job.stored_path.clone(),
    };

    info!(
        "Worker {} processing job {} file={}",
        worker_id, job.id, job.original_filename
    );
    ledger.append(HistoryEvent::processing(job));

    let mut ctx = PipelineContext::new(&job.id);
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| pipeline.run(job, &mut ctx)));

    let event = match outcome {
        Ok(Ok(response)) => {
            info!("Job {} printed successfully", job.id);
            HistoryEvent::printed(job, response)
        }
        Ok(Err(PipelineError::ConversionFailed(e))) => {
            error!("Job {} conversion failed: {}", job.id, e);
            HistoryEvent::conversion_failed(job, e.to_string())
        }
        Ok(Err(PipelineError::PrintFailed(e))) => {
            error!("Job {} print failed: {}", job.id, e);
            HistoryEvent::print_failed(job, e.to_string())
        }
        Ok(Err(fault @ PipelineError::Storage(_))) => {
            fault_event(worker_id, job, ctx.stage, &fault.to_string())
        }
        Err(panic) => fault_event(worker_id, job, ctx.stage, &panic_message(panic.as_ref())),
    };

    ledger.append(event);
}

/// Accounts an unexpected fault against the stage it happened in.
fn fault_event(worker_id: usize, job: &Job, stage: Stage, message: &str) -> HistoryEvent {
    error!(
        "Unhandled fault in worker {} on job {} during {:?}: {}",
        worker_id, job.id, stage, message
    );

    let error = format!("unexpected worker fault: {}", message);
    match stage {
        Stage::Staging | Stage::Converting => HistoryEvent::conversion_failed(job, error),
        Stage::Printing => HistoryEvent::print_failed(job, error),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic with non-string payload".to_string()
    }
}
