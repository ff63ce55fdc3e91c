//! Keyword mining pipeline.
//!
//! For each record of a wiki dump, writes
//!
//! - the ids of known verbs and links it contains to `vectors.jsonl`,
//! - every sentence where a known verb co-occurs with a link to `intersections.jsonl`.
use std::path::PathBuf;

use log::info;

use crate::error::Error;
use crate::extract::Extractors;
use crate::index::KeywordIndex;
use crate::io::LogSink;
use crate::sources::WikiDump;

use super::{Pipeline, RunOptions, RunSummary, Shutdown, Supervisor};

pub struct Mining {
    src: PathBuf,
    verbs: PathBuf,
    links: PathBuf,
    dst: PathBuf,
    options: RunOptions,
    shutdown: Shutdown,
}

impl Mining {
    pub fn new(
        src: PathBuf,
        verbs: PathBuf,
        links: PathBuf,
        dst: PathBuf,
        options: RunOptions,
        shutdown: Shutdown,
    ) -> Self {
        Self {
            src,
            verbs,
            links,
            dst,
            options,
            shutdown,
        }
    }
}

impl Pipeline<RunSummary> for Mining {
    fn run(&self) -> Result<RunSummary, Error> {
        let verbs = KeywordIndex::from_path(&self.verbs)?;
        let links = KeywordIndex::from_path(&self.links)?;
        let extractor = Extractors::mining(verbs, links);

        std::fs::create_dir_all(&self.dst)?;
        let (checkpoint, resume) = self.options.resolve(&self.dst)?;
        let sink = LogSink::new(
            &self.dst.join("vectors.jsonl"),
            &self.dst.join("intersections.jsonl"),
        );

        info!("mining {:?} into {:?}", self.src, self.dst);
        let mut source = WikiDump::from_path(&self.src)?;
        Supervisor::new(self.options.pool.clone(), self.shutdown.clone())
            .with_checkpoint(checkpoint)
            .run(&mut source, resume, &extractor, sink)
    }
}
