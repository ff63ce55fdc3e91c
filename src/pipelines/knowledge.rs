//! Phrase knowledge gathering pipeline.
//!
//! Counts in how many records each candidate phrase appears and
//! periodically saves the frequent ones to `knowledge_<records>.json`.
use std::path::PathBuf;

use log::info;

use crate::error::Error;
use crate::extract::PhraseGatherer;
use crate::io::writer::KnowledgeConfig;
use crate::io::KnowledgeSink;
use crate::sources::WikiDump;

use super::{Pipeline, RunOptions, RunSummary, Shutdown, Supervisor};

pub struct Knowledge {
    src: PathBuf,
    dst: PathBuf,
    min_words: usize,
    max_words: usize,
    config: KnowledgeConfig,
    options: RunOptions,
    shutdown: Shutdown,
}

impl Knowledge {
    pub fn new(
        src: PathBuf,
        dst: PathBuf,
        (min_words, max_words): (usize, usize),
        config: KnowledgeConfig,
        options: RunOptions,
        shutdown: Shutdown,
    ) -> Self {
        Self {
            src,
            dst,
            min_words,
            max_words,
            config,
            options,
            shutdown,
        }
    }
}

impl Pipeline<RunSummary> for Knowledge {
    fn run(&self) -> Result<RunSummary, Error> {
        let extractor = PhraseGatherer::new(self.min_words, self.max_words);

        std::fs::create_dir_all(&self.dst)?;
        let (checkpoint, resume) = self.options.resolve(&self.dst)?;
        let sink = KnowledgeSink::resume(&self.dst, self.config.clone(), resume)?;

        info!(
            "gathering phrases of {}..={} words from {:?}",
            self.min_words, self.max_words, self.src
        );
        let mut source = WikiDump::from_path(&self.src)?;
        Supervisor::new(self.options.pool.clone(), self.shutdown.clone())
            .with_checkpoint(checkpoint)
            .run(&mut source, resume, &extractor, sink)
    }
}
