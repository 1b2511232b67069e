use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use crossbeam_channel::{unbounded, Receiver, Sender};
use log::{debug, info};

use crate::error::WorkerError;
use crate::worker::job::Job;

/// What a worker pulls off the queue.
#[derive(Debug)]
pub enum QueueMessage {
    Job(Job),
    /// Stop token; exactly one is delivered per worker on shutdown.
    Shutdown,
}

/// Unbounded FIFO hand-off between the ingestion side and the workers.
///
/// Enqueue never blocks; dequeue blocks until a message arrives. Once
/// [`JobQueue::close`] has run, new jobs are rejected, so every stop token
/// sits behind all admitted jobs.
pub struct JobQueue {
    sender: Sender<QueueMessage>,
    receiver: Receiver<QueueMessage>,
    closed: Mutex<bool>,
    /// Jobs sent but not yet taken; stop tokens are not counted.
    pending: AtomicUsize,
}

impl JobQueue {
    pub fn new() -> Self {
        let (sender, receiver) = unbounded();
        Self {
            sender,
            receiver,
            closed: Mutex::new(false),
            pending: AtomicUsize::new(0),
        }
    }

    fn closed(&self) -> MutexGuard<'_, bool> {
        self.closed.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn enqueue(&self, job: Job) -> Result<(), WorkerError> {
        self.enqueue_with(job, |_| {})
    }

    /// Appends `job` to the tail, running `on_admit` first while holding the
    /// admission lock. Nothing `on_admit` records can be observed after a
    /// worker has picked the job up.
    pub fn enqueue_with<F>(&self, job: Job, on_admit: F) -> Result<(), WorkerError>
    where
        F: FnOnce(&Job),
    {
        let closed = self.closed();
        if *closed {
            return Err(WorkerError::ChannelClosed);
        }

        on_admit(&job);
        debug!("Enqueued job {}", job.id);
        // Counted before sending so a worker can never decrement first.
        self.pending.fetch_add(1, Ordering::AcqRel);
        self.sender.send(QueueMessage::Job(job)).map_err(|_| {
            self.pending.fetch_sub(1, Ordering::AcqRel);
            WorkerError::ChannelClosed
        })
    }

    /// Blocks until the next message. A disconnected channel reads as
    /// shutdown.
    pub fn dequeue(&self) -> QueueMessage {
        let message = self.receiver.recv().unwrap_or(QueueMessage::Shutdown);
        if matches!(message, QueueMessage::Job(_)) {
            self.pending.fetch_sub(1, Ordering::AcqRel);
        }
        message
    }

    /// Closes admission and queues one stop token per worker.
    ///
    /// Returns `false` if the queue was already closed; no further tokens are
    /// sent in that case.
    pub fn close(&self, workers: usize) -> bool {
        let mut closed = self.closed();
        if *closed {
            return false;
        }
        *closed = true;

        info!("Closing job queue, signalling {} workers", workers);
        for _ in 0..workers {
            // Cannot fail: self holds a receiver.
            let _ = self.sender.send(QueueMessage::Shutdown);
        }
        true
    }

    pub fn is_closed(&self) -> bool {
        *self.closed()
    }

    /// Jobs waiting for a worker. Best effort.
    pub fn depth(&self) -> usize {
        self.pending.load(Ordering::Acquire)
    }
}

impl Default for JobQueue {
    fn default() -> Self {
        Self::new()
    }
}
