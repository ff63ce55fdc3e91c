//! Worker pool.
//!
//! Workers pull [Batch]es from a bounded task queue, run the extractor
//! and push [ResultBatch]es to a bounded results queue.
//! A worker stops once the task queue is both empty and closed.
use std::panic::{self, AssertUnwindSafe};
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, SendTimeoutError, Sender};
use log::{debug, error, trace, warn};

use crate::error::Error;
use crate::extract::Extract;

use super::batch::{Batch, Envelope, ResultBatch};

/// Sizing and timing of the worker pool.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    pub workers: usize,
    /// Records per batch.
    pub batch_size: usize,
    /// Capacity (in batches) of both the task and the result queues.
    pub queue_size: usize,
    /// Log progress every `progress_every` records read.
    pub progress_every: u64,
    /// How long blocking queue operations wait before re-checking state.
    pub poll: Duration,
    pub backoff: Backoff,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            workers: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
            batch_size: 1000,
            queue_size: 100,
            progress_every: 10_000,
            poll: Duration::from_millis(100),
            backoff: Backoff::default(),
        }
    }
}

/// Exponential retry delay for a full results queue.
#[derive(Debug, Clone, Copy)]
pub struct Backoff {
    pub initial: Duration,
    pub max: Duration,
}

impl Default for Backoff {
    fn default() -> Self {
        Self {
            initial: Duration::from_millis(10),
            max: Duration::from_secs(1),
        }
    }
}

impl Backoff {
    /// Default backoff capped at `max`; the first delay never exceeds the cap.
    pub fn capped(max: Duration) -> Self {
        Self {
            initial: Backoff::default().initial.min(max),
            max,
        }
    }

    fn next(&self, current: Duration) -> Duration {
        (current * 2).min(self.max)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Idle,
    Processing,
    /// Task queue closed and empty.
    Draining,
    Stopped,
}

/// What a worker did before stopping.
#[derive(Debug)]
pub struct WorkerReport {
    pub id: usize,
    pub batches: u64,
    pub records: u64,
    pub state: WorkerState,
    /// Set if the worker stopped because of an error.
    pub failure: Option<Error>,
}

impl WorkerReport {
    fn new(id: usize) -> Self {
        Self {
            id,
            batches: 0,
            records: 0,
            state: WorkerState::Idle,
            failure: None,
        }
    }

    fn transition(&mut self, state: WorkerState) {
        trace!("worker {}: {:?} -> {:?}", self.id, self.state, state);
        self.state = state;
    }
}

/// Push a result, retrying with exponential backoff while the queue is full.
///
/// Fails if the receiving end is gone.
fn push(
    results: &Sender<Envelope<ResultBatch>>,
    batch: ResultBatch,
    backoff: &Backoff,
) -> Result<(), Error> {
    let mut delay = backoff.initial.min(backoff.max);
    let mut envelope = Envelope::Data(batch);
    let mut retries = 0u32;
    loop {
        match results.send_timeout(envelope, delay) {
            Ok(()) => return Ok(()),
            Err(SendTimeoutError::Timeout(e)) => {
                retries += 1;
                if delay >= backoff.max {
                    warn!("results queue full, retried {} times", retries);
                }
                envelope = e;
                delay = backoff.next(delay);
            }
            Err(SendTimeoutError::Disconnected(_)) => {
                return Err(Error::Channel("results queue closed".to_string()))
            }
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Worker loop.
///
/// A panicking extractor loses its batch and stops the worker;
/// other workers keep going.
pub fn work<E: Extract + ?Sized>(
    id: usize,
    extractor: &E,
    tasks: &Receiver<Batch>,
    results: &Sender<Envelope<ResultBatch>>,
    config: &PoolConfig,
) -> WorkerReport {
    let mut report = WorkerReport::new(id);
    debug!("worker {} started", id);

    loop {
        let batch = match tasks.recv_timeout(config.poll) {
            Ok(batch) => batch,
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => {
                report.transition(WorkerState::Draining);
                break;
            }
        };

        report.transition(WorkerState::Processing);
        let (batch_id, start, end) = (batch.id, batch.start, batch.end);
        let result = match panic::catch_unwind(AssertUnwindSafe(|| batch.extract(extractor))) {
            Ok(result) => result,
            Err(payload) => {
                let msg = format!(
                    "batch {} (records {}..{}): {}",
                    batch_id,
                    start,
                    end,
                    panic_message(payload.as_ref())
                );
                error!("worker {} panicked on {}", id, msg);
                report.failure = Some(Error::WorkerPanic(msg));
                break;
            }
        };

        report.records += result.records as u64;
        if let Err(e) = push(results, result, &config.backoff) {
            error!("worker {}: could not push batch {}: {}", id, batch_id, e);
            report.failure = Some(e);
            break;
        }
        report.batches += 1;
        report.transition(WorkerState::Idle);
    }

    report.transition(WorkerState::Stopped);
    debug!(
        "worker {} stopped after {} batches ({} records)",
        id, report.batches, report.records
    );
    report
}
