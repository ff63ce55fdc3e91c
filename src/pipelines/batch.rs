//! Units of work moved between stages.
use crate::extract::{Extract, Extracted};
use crate::sources::Record;

/// Consecutive source records, covering source offsets `[start, end)`.
///
/// Malformed pages are part of the range but not of `records`,
/// so a batch may be empty while still covering source offsets.
#[derive(Debug, Clone)]
pub struct Batch {
    pub id: u64,
    pub start: u64,
    pub end: u64,
    pub records: Vec<Record>,
}

impl Batch {
    /// Run `extractor` over every record, consuming the batch.
    pub fn extract<E: Extract + ?Sized>(self, extractor: &E) -> ResultBatch {
        let mut output = Vec::new();
        for record in &self.records {
            extractor.extract(record, &mut output);
        }
        ResultBatch {
            id: self.id,
            start: self.start,
            end: self.end,
            records: self.records.len(),
            output,
        }
    }
}

/// Output of a [Batch].
#[derive(Debug, Clone)]
pub struct ResultBatch {
    pub id: u64,
    pub start: u64,
    pub end: u64,
    /// Number of records the output was computed from.
    pub records: usize,
    pub output: Vec<Extracted>,
}

/// Message on the results channel.
///
/// `Done` is sent once, after every worker has exited.
#[derive(Debug)]
pub enum Envelope<T> {
    Data(T),
    Done,
}

impl<T> Envelope<T> {
    pub fn into_data(self) -> Option<T> {
        match self {
            Envelope::Data(data) => Some(data),
            Envelope::Done => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::PhraseGatherer;

    #[test]
    fn extract_keeps_range() {
        let batch = Batch {
            id: 4,
            start: 10,
            end: 13,
            records: vec![
                Record::new(10, "a".to_string(), "hello".to_string()),
                Record::new(12, "b".to_string(), "1234".to_string()),
            ],
        };
        let result = batch.extract(&PhraseGatherer::default());
        assert_eq!((result.id, result.start, result.end), (4, 10, 13));
        assert_eq!(result.records, 2);
        // "1234" has no candidate phrase
        assert_eq!(result.output.len(), 1);
    }
}
