/*!
# IO utilities

Durable output of the pipelines.

- [JsonlLog] is an append-only, newline-delimited JSON file.
- [Sink]s consume extraction results: [LogSink] appends them to two logs,
  [KnowledgeSink] aggregates phrase counts and saves periodic snapshots.
- [Checkpoint] and [Watermark] track which part of the source is durably processed.
!*/
mod checkpoint;
pub mod writer;

pub use checkpoint::{Checkpoint, Watermark};
pub use writer::{JsonlLog, KnowledgeSink, LogSink, Sink};
