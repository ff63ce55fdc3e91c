//! Phrase counting with periodic snapshots.
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use log::{debug, info};
use rayon::prelude::*;
use serde::ser::{Serialize, Serializer};

use crate::error::Error;
use crate::extract::Extracted;
use crate::io::checkpoint::tmp_path;
use crate::pipelines::ResultBatch;

use super::Sink;

#[derive(Debug, Clone)]
pub struct KnowledgeConfig {
    /// Save a snapshot every `save_every` source records.
    pub save_every: u64,
    /// Phrases seen in fewer records are forgotten when saving.
    pub min_count: u64,
}

impl Default for KnowledgeConfig {
    fn default() -> Self {
        Self {
            save_every: 10_000,
            min_count: 2,
        }
    }
}

/// Counts, for each phrase, the number of records it appears in.
///
/// Counts live in memory: the sink is durable up to the last saved snapshot.
pub struct KnowledgeSink {
    dst: PathBuf,
    config: KnowledgeConfig,
    counts: HashMap<String, u64>,
    saved: u64,
    snapshots: Vec<PathBuf>,
}

/// Serializes as a JSON object, keeping slice order.
struct Ordered<'a>(&'a [(&'a String, &'a u64)]);

impl<'a> Serialize for Ordered<'a> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.0.iter().copied())
    }
}

impl KnowledgeSink {
    /// `dst` must be an existing directory.
    /// `start` is the offset the run resumes from.
    pub fn new(dst: &Path, config: KnowledgeConfig, start: u64) -> Self {
        Self {
            dst: dst.to_path_buf(),
            config,
            counts: HashMap::new(),
            saved: start,
            snapshots: Vec::new(),
        }
    }

    /// Sink resuming at `start`, seeded with the snapshot saved at that offset.
    ///
    /// Fails if `start > 0` and there is no such snapshot in `dst`.
    pub fn resume(dst: &Path, config: KnowledgeConfig, start: u64) -> Result<Self, Error> {
        let mut sink = Self::new(dst, config, start);
        if start == 0 {
            return Ok(sink);
        }

        let path = sink.snapshot_path(start);
        if !path.exists() {
            return Err(Error::Resume(format!(
                "cannot resume phrase counts at record {}: {:?} not found",
                start, path
            )));
        }
        let f = BufReader::new(File::open(&path)?);
        sink.counts = serde_json::from_reader(f)?;
        info!("resumed {} phrases from {:?}", sink.counts.len(), path);
        Ok(sink)
    }

    fn snapshot_path(&self, offset: u64) -> PathBuf {
        self.dst.join(format!("knowledge_{}.json", offset))
    }

    pub fn count(&self, phrase: &str) -> Option<u64> {
        self.counts.get(phrase).copied()
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Paths of the snapshots written so far.
    pub fn snapshots(&self) -> &[PathBuf] {
        &self.snapshots
    }

    /// Forget rare phrases.
    fn prune(&mut self) {
        let before = self.counts.len();
        let min_count = self.config.min_count;
        self.counts.retain(|_, count| *count >= min_count);
        debug!("pruned {} phrases", before - self.counts.len());
    }

    /// Prune, then write `knowledge_<offset>.json` sorted by decreasing count.
    fn snapshot(&mut self, offset: u64) -> Result<(), Error> {
        self.prune();

        let mut sorted: Vec<(&String, &u64)> = self.counts.iter().collect();
        sorted.par_sort_unstable_by(|(pa, ca), (pb, cb)| cb.cmp(ca).then_with(|| pa.cmp(pb)));

        let path = self.snapshot_path(offset);
        let tmp = tmp_path(&path);
        {
            let mut w = BufWriter::new(File::create(&tmp)?);
            serde_json::to_writer(&mut w, &Ordered(&sorted))?;
            w.write_all(b"\n")?;
            w.flush()?;
            w.get_ref().sync_all()?;
        }
        std::fs::rename(&tmp, &path)?;

        info!(
            "saved {} phrases to {:?} ({} records)",
            sorted.len(),
            path,
            offset
        );
        self.saved = offset;
        self.snapshots.push(path);
        Ok(())
    }
}

impl Sink for KnowledgeSink {
    fn consume(&mut self, batch: ResultBatch) -> Result<(), Error> {
        for extracted in batch.output {
            if let Extracted::Phrases(set) = extracted {
                for phrase in set.phrases {
                    *self.counts.entry(phrase).or_insert(0) += 1;
                }
            }
        }
        Ok(())
    }

    fn durable(&mut self, offset: u64) -> Result<Option<u64>, Error> {
        if offset >= self.saved + self.config.save_every {
            self.snapshot(offset)?;
            Ok(Some(offset))
        } else {
            Ok(None)
        }
    }

    fn finish(&mut self, offset: u64) -> Result<u64, Error> {
        if offset > self.saved || self.snapshots.is_empty() {
            self.snapshot(offset)?;
        }
        Ok(self.saved)
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::extract::PhraseSet;

    fn batch(id: u64, start: u64, sets: &[&[&str]]) -> ResultBatch {
        let output: Vec<Extracted> = sets
            .iter()
            .map(|phrases| {
                Extracted::Phrases(PhraseSet {
                    title: format!("t{}", id),
                    phrases: phrases.iter().map(|p| p.to_string()).collect(),
                })
            })
            .collect();
        ResultBatch {
            id,
            start,
            end: start + sets.len() as u64,
            records: sets.len(),
            output,
        }
    }

    #[test]
    fn counts_and_prunes() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = KnowledgeSink::new(
            dir.path(),
            KnowledgeConfig {
                save_every: 100,
                min_count: 2,
            },
            0,
        );
        sink.consume(batch(0, 0, &[&["a", "b"], &["b", "c"], &["b", "a"]]))
            .unwrap();
        assert_eq!(sink.count("b"), Some(3));
        assert_eq!(sink.durable(3).unwrap(), None);

        assert_eq!(sink.finish(3).unwrap(), 3);
        assert_eq!(sink.count("c"), None);

        let path = dir.path().join("knowledge_3.json");
        assert_eq!(sink.snapshots(), &[path.clone()]);
        let content = fs::read_to_string(path).unwrap();
        assert_eq!(content.trim(), r#"{"b":3,"a":2}"#);
    }

    #[test]
    fn periodic_snapshots() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = KnowledgeSink::new(
            dir.path(),
            KnowledgeConfig {
                save_every: 2,
                min_count: 1,
            },
            10,
        );
        sink.consume(batch(0, 10, &[&["x"]])).unwrap();
        assert_eq!(sink.durable(11).unwrap(), None);
        sink.consume(batch(1, 11, &[&["x"]])).unwrap();
        assert_eq!(sink.durable(12).unwrap(), Some(12));
        assert!(dir.path().join("knowledge_12.json").exists());

        // nothing new since the last snapshot
        assert_eq!(sink.finish(12).unwrap(), 12);
        assert_eq!(sink.snapshots().len(), 1);
    }

    #[test]
    fn resume_from_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let config = KnowledgeConfig {
            save_every: 100,
            min_count: 1,
        };
        let mut first = KnowledgeSink::new(dir.path(), config.clone(), 0);
        first.consume(batch(0, 0, &[&["cat"], &["cat", "dog"]])).unwrap();
        first.finish(2).unwrap();

        let mut resumed = KnowledgeSink::resume(dir.path(), config, 2).unwrap();
        assert_eq!(resumed.count("cat"), Some(2));
        resumed.consume(batch(1, 2, &[&["cat"]])).unwrap();
        resumed.finish(3).unwrap();

        let content = fs::read_to_string(dir.path().join("knowledge_3.json")).unwrap();
        assert_eq!(content.trim(), r#"{"cat":3,"dog":1}"#);
    }

    #[test]
    fn resume_without_snapshot_fails() {
        let dir = tempfile::tempdir().unwrap();
        let result = KnowledgeSink::resume(dir.path(), KnowledgeConfig::default(), 5);
        assert!(matches!(result, Err(Error::Resume(_))));
        assert!(KnowledgeSink::resume(dir.path(), KnowledgeConfig::default(), 0).is_ok());
    }

    #[test]
    fn ties_are_sorted_by_phrase() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = KnowledgeSink::new(dir.path(), KnowledgeConfig::default(), 0);
        sink.consume(batch(0, 0, &[&["zeta", "alpha"], &["alpha", "zeta"]]))
            .unwrap();
        sink.finish(2).unwrap();
        let content = fs::read_to_string(dir.path().join("knowledge_2.json")).unwrap();
        assert_eq!(content.trim(), r#"{"alpha":2,"zeta":2}"#);
    }
}
