//! Run orchestration.
//!
//! The supervisor owns the source and every thread of a run:
//!
//! 1. skip already processed records when resuming,
//! 1. spawn the aggregator and the workers,
//! 1. read the source on the current thread, grouping records in batches,
//! 1. close the task queue, join the workers, signal `Done` and join the aggregator.
//!
//! On interruption, reading stops but queued batches are still processed,
//! so the run ends on a consistent checkpoint.
use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::thread;

use crossbeam_channel::{bounded, SendTimeoutError, Sender};
use log::{debug, error, info, trace, warn};

use crate::error::Error;
use crate::extract::Extract;
use crate::io::{Checkpoint, Sink};
use crate::sources::WikiDump;

use super::aggregator::{aggregate, AggregatorReport, AggregatorState};
use super::batch::{Batch, Envelope, ResultBatch};
use super::workers::{work, PoolConfig, WorkerReport, WorkerState};
use super::Shutdown;

/// Options shared by every pipeline.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub pool: PoolConfig,
    /// Explicit number of records to skip.
    pub resume: Option<u64>,
    /// Checkpoint file, defaults to `<dst>/checkpoint.json`.
    pub checkpoint: Option<PathBuf>,
}

impl RunOptions {
    /// Checkpoint path and number of records to skip.
    ///
    /// An explicit resume offset wins over an existing checkpoint.
    pub fn resolve(&self, dst: &Path) -> Result<(PathBuf, u64), Error> {
        let path = self
            .checkpoint
            .clone()
            .unwrap_or_else(|| dst.join("checkpoint.json"));

        let resume = match self.resume {
            Some(resume) => resume,
            None => match Checkpoint::load_opt(&path)? {
                Some(cp) => {
                    info!(
                        "resuming from {:?}: {} records already consumed",
                        path, cp.records_consumed
                    );
                    cp.records_consumed
                }
                None => 0,
            },
        };
        Ok((path, resume))
    }
}

/// Outcome of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// Records skipped because of resuming.
    pub skipped: u64,
    /// Source offset reached by the reader (skipped records included).
    pub consumed: u64,
    /// Malformed pages dropped by the reader.
    pub malformed: u64,
    pub batches: u64,
    /// Records whose output reached the sink.
    pub processed: u64,
    /// Offset to resume from.
    pub resume_offset: u64,
    pub worker_failures: usize,
    pub interrupted: bool,
}

impl RunSummary {
    /// `true` if the whole source has durable output.
    pub fn is_complete(&self) -> bool {
        !self.interrupted && self.worker_failures == 0
    }
}

#[derive(Debug, Default)]
struct FeedReport {
    batches: u64,
    records: u64,
    interrupted: bool,
    failure: Option<Error>,
}

pub struct Supervisor {
    config: PoolConfig,
    shutdown: Shutdown,
    checkpoint: Option<PathBuf>,
}

impl Supervisor {
    pub fn new(config: PoolConfig, shutdown: Shutdown) -> Self {
        Self {
            config,
            shutdown,
            checkpoint: None,
        }
    }

    /// Save checkpoints to `path`.
    pub fn with_checkpoint(mut self, path: PathBuf) -> Self {
        self.checkpoint = Some(path);
        self
    }

    /// Send a batch, waiting while the task queue is full.
    ///
    /// Fails if every worker has stopped.
    fn dispatch(&self, tasks: &Sender<Batch>, mut batch: Batch) -> Result<(), Error> {
        loop {
            match tasks.send_timeout(batch, self.config.poll) {
                Ok(()) => return Ok(()),
                Err(SendTimeoutError::Timeout(b)) => {
                    trace!("task queue full");
                    batch = b;
                }
                Err(SendTimeoutError::Disconnected(_)) => {
                    return Err(Error::Channel("every worker has stopped".to_string()))
                }
            }
        }
    }

    /// Read the source into batches until it is exhausted, fails or an interruption is requested.
    ///
    /// Dropping `tasks` on return closes the task queue.
    fn feed<R: BufRead>(&self, source: &mut WikiDump<R>, tasks: Sender<Batch>) -> FeedReport {
        let batch_size = self.config.batch_size.max(1);
        let mut report = FeedReport::default();
        let mut batch = Batch {
            id: 0,
            start: source.consumed(),
            end: source.consumed(),
            records: Vec::with_capacity(batch_size),
        };

        loop {
            if self.shutdown.is_requested() {
                warn!("interrupted: stopped reading at record {}", batch.end);
                report.interrupted = true;
                break;
            }

            match source.next() {
                Some(Ok(record)) => {
                    batch.records.push(record);
                    batch.end = source.consumed();
                    report.records += 1;
                    if report.records % self.config.progress_every.max(1) == 0 {
                        info!(
                            "{} records read, {} batches queued (offset {})",
                            report.records, report.batches, batch.end
                        );
                    }

                    if batch.records.len() >= batch_size {
                        let next = Batch {
                            id: batch.id + 1,
                            start: batch.end,
                            end: batch.end,
                            records: Vec::with_capacity(batch_size),
                        };
                        let full = std::mem::replace(&mut batch, next);
                        if let Err(e) = self.dispatch(&tasks, full) {
                            report.failure = Some(e);
                            return report;
                        }
                        report.batches += 1;
                    }
                }
                Some(Err(e)) => {
                    error!("source failed after offset {}: {}", batch.end, e);
                    report.failure = Some(e);
                    break;
                }
                None => {
                    // trailing malformed pages
                    batch.end = source.consumed();
                    break;
                }
            }
        }

        // last batch may hold no record but still cover source offsets
        if batch.end > batch.start {
            match self.dispatch(&tasks, batch) {
                Ok(()) => report.batches += 1,
                Err(e) => {
                    report.failure.get_or_insert(e);
                }
            }
        }
        report
    }

    /// Run `extractor` over `source` (skipping `resume` records), writing results to `sink`.
    ///
    /// Errors are returned only once every thread has been joined.
    /// Worker failures lose their batch and are reported in the summary.
    pub fn run<R, E, S>(
        &self,
        source: &mut WikiDump<R>,
        resume: u64,
        extractor: &E,
        sink: S,
    ) -> Result<RunSummary, Error>
    where
        R: BufRead,
        E: Extract + ?Sized,
        S: Sink,
    {
        let skipped = if resume > 0 {
            info!("skipping {} records", resume);
            source.skip_records(resume)?
        } else {
            0
        };
        let start = source.consumed();

        let config = &self.config;
        let checkpoint = self.checkpoint.clone();
        let (task_tx, task_rx) = bounded::<Batch>(config.queue_size.max(1));
        let (result_tx, result_rx) = bounded::<Envelope<ResultBatch>>(config.queue_size.max(1));

        info!(
            "starting {} workers (batch size {}, queue size {})",
            config.workers, config.batch_size, config.queue_size
        );
        let (feed, workers, aggregator) = thread::scope(|s| {
            let aggregator =
                s.spawn(move || aggregate(result_rx, sink, start, checkpoint, config.poll));

            let workers: Vec<_> = (0..config.workers.max(1))
                .map(|id| {
                    let tasks = task_rx.clone();
                    let results = result_tx.clone();
                    s.spawn(move || work(id, extractor, &tasks, &results, config))
                })
                .collect();
            drop(task_rx);

            let feed = self.feed(source, task_tx);

            let workers: Vec<WorkerReport> = workers
                .into_iter()
                .enumerate()
                .map(|(id, handle)| {
                    handle.join().unwrap_or_else(|_| WorkerReport {
                        id,
                        batches: 0,
                        records: 0,
                        state: WorkerState::Stopped,
                        failure: Some(Error::WorkerPanic(format!("worker {} died", id))),
                    })
                })
                .collect();

            if result_tx.send(Envelope::Done).is_err() {
                debug!("aggregator stopped before completion");
            }
            drop(result_tx);

            let aggregator = aggregator.join().unwrap_or_else(|_| AggregatorReport {
                batches: 0,
                records: 0,
                durable: start,
                state: AggregatorState::Stopped,
                failure: Some(Error::Custom("aggregator died".to_string())),
            });
            (feed, workers, aggregator)
        });

        let mut worker_failures = Vec::new();
        for report in workers {
            if let Some(e) = report.failure {
                error!("worker {} failed: {}", report.id, e);
                worker_failures.push(e);
            }
        }

        let summary = RunSummary {
            skipped,
            consumed: source.consumed(),
            malformed: source.skipped_malformed(),
            batches: aggregator.batches,
            processed: aggregator.records,
            resume_offset: aggregator.durable,
            worker_failures: worker_failures.len(),
            interrupted: feed.interrupted,
        };
        debug!(
            "read {} records in {} batches",
            feed.records, feed.batches
        );

        // a failed aggregator makes both feeder and workers fail
        if let Some(e) = aggregator.failure.or(feed.failure) {
            error!(
                "run failed, output is durable up to record {}",
                summary.resume_offset
            );
            return Err(e);
        }

        info!(
            "processed {} records in {} batches ({} malformed, {} skipped), resume offset {}",
            summary.processed,
            summary.batches,
            summary.malformed,
            summary.skipped,
            summary.resume_offset
        );
        Ok(summary)
    }
}
