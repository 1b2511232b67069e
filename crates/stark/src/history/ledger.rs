use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

use super::event::HistoryEvent;

/// Bounded, append-only log of job lifecycle events.
///
/// Holds the most recent `capacity` events; older ones are evicted in
/// insertion order. Appends and reads take the same lock, so every read is a
/// consistent snapshot.
pub struct HistoryLedger {
    capacity: usize,
    events: Mutex<VecDeque<HistoryEvent>>,
}

impl HistoryLedger {
    /// A capacity of zero is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            events: Mutex::new(VecDeque::with_capacity(capacity)),
        }
    }

    // A writer that panicked mid-append cannot leave a half-written entry
    // behind (push_back is the only mutation), so a poisoned lock is safe to
    // reuse.
    fn lock(&self) -> MutexGuard<'_, VecDeque<HistoryEvent>> {
        self.events.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn append(&self, event: HistoryEvent) {
        let mut events = self.lock();
        if events.len() == self.capacity {
            events.pop_front();
        }
        events.push_back(event);
    }

    /// Up to `n` most recent events, oldest first.
    pub fn recent(&self, n: usize) -> Vec<HistoryEvent> {
        let events = self.lock();
        let skip = events.len().saturating_sub(n);
        events.iter().skip(skip).cloned().collect()
    }

    /// Retained events of a single job, oldest first.
    pub fn events_for(&self, job_id: &str) -> Vec<HistoryEvent> {
        self.lock()
            .iter()
            .filter(|e| e.job_id == job_id)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for HistoryLedger {
    fn default() -> Self {
        Self::new(200)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::event::JobStatus;
    use chrono::Utc;
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::thread;

    fn event(job_id: &str, status: JobStatus) -> HistoryEvent {
        HistoryEvent {
            timestamp: Utc::now(),
            job_id: job_id.to_string(),
            filename: "doc.pdf".to_string(),
            status,
            client: None,
            error: None,
            printer_response: None,
        }
    }

    #[test]
    fn test_evicts_oldest_past_capacity() {
        let ledger = HistoryLedger::new(3);
        for i in 0..4 {
            ledger.append(event(&format!("job-{i}"), JobStatus::Queued));
        }

        let ids: Vec<String> = ledger.recent(10).into_iter().map(|e| e.job_id).collect();
        assert_eq!(ids, vec!["job-1", "job-2", "job-3"]);
        assert_eq!(ledger.len(), 3);
    }

    #[test]
    fn test_recent_returns_tail_in_order() {
        let ledger = HistoryLedger::new(10);
        for i in 0..6 {
            ledger.append(event(&format!("job-{i}"), JobStatus::Queued));
        }

        let ids: Vec<String> = ledger.recent(2).into_iter().map(|e| e.job_id).collect();
        assert_eq!(ids, vec!["job-4", "job-5"]);
        assert!(ledger.recent(0).is_empty());
    }

    #[test]
    fn test_zero_capacity_raised_to_one() {
        let ledger = HistoryLedger::new(0);
        ledger.append(event("a", JobStatus::Queued));
        ledger.append(event("b", JobStatus::Queued));
        assert_eq!(ledger.capacity(), 1);
        assert_eq!(ledger.recent(5)[0].job_id, "b");
    }

    #[test]
    fn test_events_for_job() {
        let ledger = HistoryLedger::new(10);
        ledger.append(event("a", JobStatus::Queued));
        ledger.append(event("b", JobStatus::Queued));
        ledger.append(event("a", JobStatus::Processing));
        ledger.append(event("a", JobStatus::Printed));

        let statuses: Vec<JobStatus> =
            ledger.events_for("a").into_iter().map(|e| e.status).collect();
        assert_eq!(
            statuses,
            vec![JobStatus::Queued, JobStatus::Processing, JobStatus::Printed]
        );
    }

    #[test]
    fn test_concurrent_appends_and_reads() {
        const WRITERS: usize = 4;
        const PER_WRITER: usize = 250;

        let ledger = Arc::new(HistoryLedger::new(WRITERS * PER_WRITER));

        let writers: Vec<_> = (0..WRITERS)
            .map(|w| {
                let ledger = Arc::clone(&ledger);
                thread::spawn(move || {
                    for i in 0..PER_WRITER {
                        ledger.append(event(&format!("w{w}-{i}"), JobStatus::Printed));
                    }
                })
            })
            .collect();

        let reader = {
            let ledger = Arc::clone(&ledger);
            thread::spawn(move || {
                for _ in 0..200 {
                    let snapshot = ledger.recent(WRITERS * PER_WRITER);
                    let unique: HashSet<&str> =
                        snapshot.iter().map(|e| e.job_id.as_str()).collect();
                    assert_eq!(unique.len(), snapshot.len(), "duplicate event in snapshot");

                    // Per-writer order must match append order.
                    for w in 0..WRITERS {
                        let prefix = format!("w{w}-");
                        let seq: Vec<usize> = snapshot
                            .iter()
                            .filter_map(|e| e.job_id.strip_prefix(&prefix))
                            .map(|n| n.parse().unwrap())
                            .collect();
                        assert!(seq.windows(2).all(|p| p[0] + 1 == p[1]));
                    }
                }
            })
        };

        for writer in writers {
            writer.join().unwrap();
        }
        reader.join().unwrap();

        assert_eq!(ledger.len(), WRITERS * PER_WRITER);
    }
}
