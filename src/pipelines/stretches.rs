//! Phrase application pipeline.
//!
//! Finds known phrases and their context in every non-redirect record
//! and writes one line per record to `stretches.jsonl`.
use std::path::PathBuf;
use std::sync::Arc;

use log::info;

use crate::error::Error;
use crate::extract::{MatcherConfig, StretchExtractor};
use crate::index::PhraseVocabulary;
use crate::io::LogSink;
use crate::sources::WikiDump;

use super::{Pipeline, RunOptions, RunSummary, Shutdown, Supervisor};

pub struct Stretches {
    src: PathBuf,
    phrases: PathBuf,
    dst: PathBuf,
    matcher: MatcherConfig,
    options: RunOptions,
    shutdown: Shutdown,
}

impl Stretches {
    pub fn new(
        src: PathBuf,
        phrases: PathBuf,
        dst: PathBuf,
        matcher: MatcherConfig,
        options: RunOptions,
        shutdown: Shutdown,
    ) -> Self {
        Self {
            src,
            phrases,
            dst,
            matcher,
            options,
            shutdown,
        }
    }
}

impl Pipeline<RunSummary> for Stretches {
    fn run(&self) -> Result<RunSummary, Error> {
        let vocabulary = Arc::new(PhraseVocabulary::from_path(&self.phrases)?);
        let extractor = StretchExtractor::new(vocabulary, self.matcher);

        std::fs::create_dir_all(&self.dst)?;
        let (checkpoint, resume) = self.options.resolve(&self.dst)?;
        // only the context log is ever written to
        let sink = LogSink::new(
            &self.dst.join("vectors.jsonl"),
            &self.dst.join("stretches.jsonl"),
        );

        info!("applying {:?} on {:?}", self.phrases, self.src);
        let mut source = WikiDump::from_path(&self.src)?;
        Supervisor::new(self.options.pool.clone(), self.shutdown.clone())
            .with_checkpoint(checkpoint)
            .run(&mut source, resume, &extractor, sink)
    }
}
