//! Pipelines.
//!
//! Every pipeline reads a wiki dump through the same [Supervisor]:
//! a reader thread, a pool of extraction workers and a single aggregator,
//! connected by bounded queues.
//!
//! The module also provides a light [Pipeline] trait implemented by the runnable pipelines.
mod aggregator;
mod batch;
mod knowledge;
mod mining;
#[allow(clippy::module_inception)]
mod pipeline;
mod shutdown;
mod stretches;
mod supervisor;
mod workers;

pub use aggregator::{aggregate, AggregatorReport, AggregatorState};
pub use batch::{Batch, Envelope, ResultBatch};
pub use knowledge::Knowledge;
pub use mining::Mining;
pub use pipeline::Pipeline;
pub use shutdown::Shutdown;
pub use stretches::Stretches;
pub use supervisor::{RunOptions, RunSummary, Supervisor};
pub use workers::{work, Backoff, PoolConfig, WorkerReport, WorkerState};
