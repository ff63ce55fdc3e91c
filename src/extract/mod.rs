/*! Record-level extraction.

Extractors are pure: given a [Record] they push zero or more [Extracted] items
and never mutate their own state. This lets a single extractor be shared by all workers.

[Extractors] chains several extractors so that they run in one step, in insertion order.
!*/
mod intersection;
mod phrases;
mod sentence;
mod stretch;
mod types;
mod vectors;

use std::sync::Arc;

use crate::index::KeywordIndex;
use crate::sources::Record;

pub use intersection::{link_references, Intersections};
pub use phrases::PhraseGatherer;
pub use sentence::{normalize, render_links, split_sentences};
pub use stretch::{MatcherConfig, StretchExtractor, StretchMatcher};
pub use types::{
    Extracted, IntersectionRecord, PhraseSet, Stretch, StretchRecord, VectorAssociation,
};
pub use vectors::KeywordVectors;

pub trait Extract: Send + Sync {
    fn extract(&self, record: &Record, out: &mut Vec<Extracted>);
}

/// Extractor chaining.
#[derive(Default)]
pub struct Extractors(Vec<Box<dyn Extract>>);

impl Extractors {
    pub fn add(&mut self, extractor: Box<dyn Extract>) -> &mut Extractors {
        self.0.push(extractor);
        self
    }

    /// Vector and intersection passes over a shared pair of indices.
    pub fn mining(verbs: KeywordIndex, links: KeywordIndex) -> Self {
        let verbs = Arc::new(verbs);
        let links = Arc::new(links);
        let mut extractors = Self::default();
        extractors
            .add(Box::new(KeywordVectors::new(verbs.clone(), links)))
            .add(Box::new(Intersections::new(verbs)));
        extractors
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Extract for Extractors {
    fn extract(&self, record: &Record, out: &mut Vec<Extracted>) {
        for extractor in &self.0 {
            extractor.extract(record, out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mining_runs_both_passes() {
        let verbs: KeywordIndex = [("live", 1)].into_iter().collect();
        let links: KeywordIndex = [("Paris", 7)].into_iter().collect();
        let ex = Extractors::mining(verbs, links);
        assert_eq!(ex.len(), 2);

        let record = Record::new(
            0,
            "Me".to_string(),
            "I live in [[Paris]], France.".to_string(),
        );
        let mut out = Vec::new();
        ex.extract(&record, &mut out);

        assert_eq!(
            out,
            vec![
                Extracted::Vector(VectorAssociation {
                    title: "Me".to_string(),
                    verb_ids: vec![1],
                    link_ids: vec![],
                }),
                Extracted::Intersection(IntersectionRecord {
                    title: "Me".to_string(),
                    link_token: "Paris".to_string(),
                    verb_token: "live".to_string(),
                    sentence: "I live in Paris, France".to_string(),
                }),
            ]
        );
    }
}
