//! Routes extraction results to two append-only logs.
use std::path::Path;

use log::debug;

use crate::error::Error;
use crate::extract::Extracted;
use crate::pipelines::ResultBatch;

use super::{JsonlLog, Sink};

/// Writes vector associations to one log and sentence-level results
/// (intersections, stretches, phrase sets) to another.
///
/// Both logs are flushed after each batch, so consumed batches are always durable.
pub struct LogSink {
    vectors: JsonlLog,
    contexts: JsonlLog,
}

impl LogSink {
    pub fn new(vectors: &Path, contexts: &Path) -> Self {
        Self {
            vectors: JsonlLog::new(vectors),
            contexts: JsonlLog::new(contexts),
        }
    }

    /// Number of lines written to (vectors, contexts).
    pub fn nb_lines(&self) -> (u64, u64) {
        (self.vectors.nb_lines(), self.contexts.nb_lines())
    }
}

impl Sink for LogSink {
    fn consume(&mut self, batch: ResultBatch) -> Result<(), Error> {
        debug!(
            "writing batch {} ({} records, {} results)",
            batch.id,
            batch.records,
            batch.output.len()
        );
        for extracted in &batch.output {
            match extracted {
                Extracted::Vector(v) => self.vectors.write(v)?,
                Extracted::Intersection(i) => self.contexts.write(i)?,
                Extracted::Stretches(s) => self.contexts.write(s)?,
                Extracted::Phrases(p) => self.contexts.write(p)?,
            }
        }
        self.vectors.flush()?;
        self.contexts.flush()
    }

    fn durable(&mut self, offset: u64) -> Result<Option<u64>, Error> {
        Ok(Some(offset))
    }

    fn finish(&mut self, offset: u64) -> Result<u64, Error> {
        self.vectors.flush()?;
        self.contexts.flush()?;
        Ok(offset)
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::extract::{IntersectionRecord, VectorAssociation};

    #[test]
    fn routing() {
        let dir = tempfile::tempdir().unwrap();
        let vectors = dir.path().join("vectors.jsonl");
        let contexts = dir.path().join("intersections.jsonl");
        let mut sink = LogSink::new(&vectors, &contexts);

        let batch = ResultBatch {
            id: 0,
            start: 0,
            end: 1,
            records: 1,
            output: vec![
                Extracted::Vector(VectorAssociation {
                    title: "Paris".to_string(),
                    verb_ids: vec![1],
                    link_ids: vec![7],
                }),
                Extracted::Intersection(IntersectionRecord {
                    title: "Paris".to_string(),
                    link_token: "France".to_string(),
                    verb_token: "live".to_string(),
                    sentence: "I live in France".to_string(),
                }),
            ],
        };
        sink.consume(batch).unwrap();
        assert_eq!(sink.finish(1).unwrap(), 1);
        assert_eq!(sink.nb_lines(), (1, 1));

        let v = fs::read_to_string(&vectors).unwrap();
        assert!(v.contains("\"verb_ids\":[1]"));
        let c = fs::read_to_string(&contexts).unwrap();
        assert!(c.contains("\"verb_token\":\"live\""));
        assert!(!c.contains("verb_ids"));
    }

    #[test]
    fn empty_batches_create_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let vectors = dir.path().join("vectors.jsonl");
        let contexts = dir.path().join("stretches.jsonl");
        let mut sink = LogSink::new(&vectors, &contexts);
        sink.consume(ResultBatch {
            id: 3,
            start: 10,
            end: 12,
            records: 2,
            output: vec![],
        })
        .unwrap();
        assert_eq!(sink.durable(12).unwrap(), Some(12));
        assert!(!vectors.exists());
        assert!(!contexts.exists());
    }
}
