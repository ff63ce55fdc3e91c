//! Command line arguments and parameters management/parsing.
use std::path::PathBuf;
use std::time::Duration;

use structopt::StructOpt;

use wikimine::extract::MatcherConfig;
use wikimine::io::writer::KnowledgeConfig;
use wikimine::pipelines::{Backoff, PoolConfig, RunOptions};

#[derive(Debug, StructOpt)]
#[structopt(name = "wikimine", about = "wiki dump mining tool.")]
/// Holds every command that is callable by the `wikimine` command.
pub enum Wikimine {
    #[structopt(about = "Extract keyword vectors and verb/link intersections")]
    Mine(Mine),
    #[structopt(about = "Find known phrases and their context")]
    Apply(Apply),
    #[structopt(about = "Count candidate phrases")]
    Gather(Gather),
}

#[derive(Debug, StructOpt)]
/// Worker pool and resume options.
pub struct Run {
    #[structopt(
        long = "workers",
        short = "w",
        help = "number of extraction workers (default: available parallelism)"
    )]
    pub workers: Option<usize>,
    #[structopt(long = "batch-size", default_value = "1000", help = "records per batch")]
    pub batch_size: usize,
    #[structopt(
        long = "queue-size",
        default_value = "100",
        help = "capacity of the task and result queues, in batches"
    )]
    pub queue_size: usize,
    #[structopt(
        long = "resume",
        help = "number of records to skip. Overrides the checkpoint file."
    )]
    pub resume: Option<u64>,
    #[structopt(
        long = "checkpoint",
        parse(from_os_str),
        help = "checkpoint file (default: <dst>/checkpoint.json). Resumed from if it exists."
    )]
    pub checkpoint: Option<PathBuf>,
    #[structopt(
        long = "progress",
        default_value = "10000",
        help = "log progress every n records"
    )]
    pub progress: u64,
    #[structopt(
        long = "max-backoff-ms",
        default_value = "1000",
        help = "maximum delay between retries when the result queue is full"
    )]
    pub max_backoff_ms: u64,
}

impl From<Run> for RunOptions {
    fn from(run: Run) -> Self {
        let defaults = PoolConfig::default();
        let backoff = Backoff::capped(Duration::from_millis(run.max_backoff_ms));
        RunOptions {
            pool: PoolConfig {
                workers: run.workers.unwrap_or(defaults.workers),
                batch_size: run.batch_size,
                queue_size: run.queue_size,
                progress_every: run.progress,
                backoff,
                ..defaults
            },
            resume: run.resume,
            checkpoint: run.checkpoint,
        }
    }
}

#[derive(Debug, StructOpt)]
pub struct Mine {
    #[structopt(parse(from_os_str), help = "wiki dump (xml, optionally gzipped)")]
    pub src: PathBuf,
    #[structopt(parse(from_os_str), help = "verb index (json object token -> id)")]
    pub verbs: PathBuf,
    #[structopt(parse(from_os_str), help = "link index (json object token -> id)")]
    pub links: PathBuf,
    #[structopt(parse(from_os_str), help = "destination folder")]
    pub dst: PathBuf,
    #[structopt(flatten)]
    pub run: Run,
}

#[derive(Debug, StructOpt)]
pub struct Apply {
    #[structopt(parse(from_os_str), help = "wiki dump (xml, optionally gzipped)")]
    pub src: PathBuf,
    #[structopt(
        parse(from_os_str),
        help = "phrase vocabulary (json array, or object with phrases as keys)"
    )]
    pub phrases: PathBuf,
    #[structopt(parse(from_os_str), help = "destination folder")]
    pub dst: PathBuf,
    #[structopt(long = "min-words", default_value = "1")]
    pub min_words: usize,
    #[structopt(
        long = "stretch-max",
        default_value = "8",
        help = "maximum number of words of a phrase"
    )]
    pub stretch_max: usize,
    #[structopt(flatten)]
    pub run: Run,
}

impl Apply {
    pub fn matcher(&self) -> MatcherConfig {
        MatcherConfig {
            min_words: self.min_words,
            stretch_max: self.stretch_max,
        }
    }
}

#[derive(Debug, StructOpt)]
pub struct Gather {
    #[structopt(parse(from_os_str), help = "wiki dump (xml, optionally gzipped)")]
    pub src: PathBuf,
    #[structopt(parse(from_os_str), help = "destination folder")]
    pub dst: PathBuf,
    #[structopt(long = "min-words", default_value = "1")]
    pub min_words: usize,
    #[structopt(long = "max-words", default_value = "8")]
    pub max_words: usize,
    #[structopt(
        long = "save-every",
        default_value = "10000",
        help = "save a snapshot every n records"
    )]
    pub save_every: u64,
    #[structopt(
        long = "min-count",
        default_value = "2",
        help = "forget phrases seen in fewer records when saving"
    )]
    pub min_count: u64,
    #[structopt(flatten)]
    pub run: Run,
}

impl Gather {
    pub fn knowledge(&self) -> KnowledgeConfig {
        KnowledgeConfig {
            save_every: self.save_every,
            min_count: self.min_count,
        }
    }
}
