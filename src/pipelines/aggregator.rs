//! Single consumer of the results queue.
//!
//! Results arrive in completion order. The aggregator hands them to a [Sink]
//! and advances a [Watermark], saving a [Checkpoint] whenever the sink
//! reports a new durable offset.
use std::path::PathBuf;
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError};
use log::{debug, error, trace, warn};

use crate::error::Error;
use crate::io::{Checkpoint, Sink, Watermark};

use super::batch::{Envelope, ResultBatch};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregatorState {
    Running,
    /// `Done` received, consuming what is left.
    Draining,
    Stopped,
}

#[derive(Debug)]
pub struct AggregatorReport {
    pub batches: u64,
    pub records: u64,
    /// Every record below this offset has durable output.
    pub durable: u64,
    pub state: AggregatorState,
    pub failure: Option<Error>,
}

struct Aggregator<S> {
    sink: S,
    watermark: Watermark,
    checkpoint: Option<PathBuf>,
    report: AggregatorReport,
}

impl<S: Sink> Aggregator<S> {
    fn handle(&mut self, batch: ResultBatch) -> Result<(), Error> {
        let (start, end, records) = (batch.start, batch.end, batch.records);
        self.sink.consume(batch)?;
        self.report.batches += 1;
        self.report.records += records as u64;

        if self.watermark.complete(start, end) {
            if let Some(offset) = self.sink.durable(self.watermark.offset())? {
                self.commit(offset)?;
            }
        } else {
            trace!(
                "batch {}..{} waits for offset {} ({} pending)",
                start,
                end,
                self.watermark.offset(),
                self.watermark.pending()
            );
        }
        Ok(())
    }

    fn commit(&mut self, offset: u64) -> Result<(), Error> {
        if let Some(path) = &self.checkpoint {
            Checkpoint::new(offset).save(path)?;
        }
        self.report.durable = offset;
        Ok(())
    }

    fn run(&mut self, results: &Receiver<Envelope<ResultBatch>>, poll: Duration) -> Result<(), Error> {
        loop {
            match results.recv_timeout(poll) {
                Ok(Envelope::Data(batch)) => self.handle(batch)?,
                Ok(Envelope::Done) => break,
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => {
                    warn!("results queue closed before completion");
                    break;
                }
            }
        }

        self.report.state = AggregatorState::Draining;
        for envelope in results.try_iter() {
            if let Some(batch) = envelope.into_data() {
                self.handle(batch)?;
            }
        }

        let offset = self.sink.finish(self.watermark.offset())?;
        self.commit(offset)
    }
}

/// Consume results until `Done`, then finish the sink.
///
/// `start` is the offset the run starts from.
/// Returning drops `results`, so that workers notice a failed aggregator.
pub fn aggregate<S: Sink>(
    results: Receiver<Envelope<ResultBatch>>,
    sink: S,
    start: u64,
    checkpoint: Option<PathBuf>,
    poll: Duration,
) -> AggregatorReport {
    let mut aggregator = Aggregator {
        sink,
        watermark: Watermark::new(start),
        checkpoint,
        report: AggregatorReport {
            batches: 0,
            records: 0,
            durable: start,
            state: AggregatorState::Running,
            failure: None,
        },
    };

    if let Err(e) = aggregator.run(&results, poll) {
        error!("aggregator failed: {}", e);
        aggregator.report.failure = Some(e);
    }
    drop(results);

    aggregator.report.state = AggregatorState::Stopped;
    debug!(
        "aggregator stopped after {} batches, durable offset {}",
        aggregator.report.batches, aggregator.report.durable
    );
    aggregator.report
}

#[cfg(test)]
mod tests {
    use crossbeam_channel::bounded;

    use super::*;
    use crate::io::LogSink;

    fn result(id: u64, start: u64, end: u64) -> Envelope<ResultBatch> {
        Envelope::Data(ResultBatch {
            id,
            start,
            end,
            records: (end - start) as usize,
            output: vec![],
        })
    }

    #[test]
    fn out_of_order_checkpoint() {
        let dir = tempfile::tempdir().unwrap();
        let cp = dir.path().join("checkpoint.json");
        let sink = LogSink::new(&dir.path().join("a.jsonl"), &dir.path().join("b.jsonl"));

        let (tx, rx) = bounded(8);
        tx.send(result(1, 12, 14)).unwrap();
        tx.send(result(0, 10, 12)).unwrap();
        tx.send(result(3, 16, 18)).unwrap();
        tx.send(Envelope::Done).unwrap();

        let report = aggregate(rx, sink, 10, Some(cp.clone()), Duration::from_millis(5));
        assert_eq!(report.batches, 3);
        assert_eq!(report.records, 6);
        // batch 2 never arrived
        assert_eq!(report.durable, 14);
        assert_eq!(report.state, AggregatorState::Stopped);
        assert!(report.failure.is_none());
        assert_eq!(Checkpoint::load(&cp).unwrap().records_consumed, 14);
    }

    struct Failing;
    impl Sink for Failing {
        fn consume(&mut self, _batch: ResultBatch) -> Result<(), Error> {
            Err(Error::Custom("disk full".to_string()))
        }
        fn durable(&mut self, offset: u64) -> Result<Option<u64>, Error> {
            Ok(Some(offset))
        }
        fn finish(&mut self, offset: u64) -> Result<u64, Error> {
            Ok(offset)
        }
    }

    #[test]
    fn sink_failure_closes_queue() {
        let (tx, rx) = bounded(1);
        tx.send(result(0, 0, 2)).unwrap();

        let report = aggregate(rx, Failing, 0, None, Duration::from_millis(5));
        assert!(report.failure.is_some());
        assert_eq!(report.durable, 0);
        assert!(tx.send(result(1, 2, 4)).is_err());
    }
}
