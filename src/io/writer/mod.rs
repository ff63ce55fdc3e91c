/*!
# Result sinks

The aggregator hands every [ResultBatch] to a [Sink], on a single thread.

A sink reports which offsets are *durable*, that is, which part of its state would survive a crash.
[LogSink] flushes after each batch so every consumed batch is durable,
while [KnowledgeSink] keeps state in memory and is only durable once a snapshot is written.
!*/
mod jsonl;
mod knowledge;
mod logsink;

pub use jsonl::JsonlLog;
pub use knowledge::{KnowledgeConfig, KnowledgeSink};
pub use logsink::LogSink;

use crate::error::Error;
use crate::pipelines::ResultBatch;

pub trait Sink: Send {
    /// Write or accumulate the output of a batch.
    fn consume(&mut self, batch: ResultBatch) -> Result<(), Error>;

    /// Notifies that every record below `offset` has been consumed.
    ///
    /// Returns the offset that is now durable, if it changed.
    fn durable(&mut self, offset: u64) -> Result<Option<u64>, Error>;

    /// Persist everything, returning the final durable offset.
    fn finish(&mut self, offset: u64) -> Result<u64, Error>;
}
