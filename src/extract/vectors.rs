//! Keyword vector pass.
//!
//! Tokens are raw whitespace-separated words: no case folding or punctuation stripping
//! is done, a token has to match an index key exactly.
use std::sync::Arc;

use crate::index::KeywordIndex;
use crate::sources::Record;

use super::{Extract, Extracted, VectorAssociation};

pub struct KeywordVectors {
    verbs: Arc<KeywordIndex>,
    links: Arc<KeywordIndex>,
}

impl KeywordVectors {
    pub fn new(verbs: Arc<KeywordIndex>, links: Arc<KeywordIndex>) -> Self {
        Self { verbs, links }
    }

    /// Returns [None] if no token is known by either index.
    pub fn vectorize(&self, title: &str, text: &str) -> Option<VectorAssociation> {
        let mut verb_ids = Vec::new();
        let mut link_ids = Vec::new();

        for token in text.split_whitespace() {
            if let Some(id) = self.verbs.get(token) {
                verb_ids.push(id);
            }
            if let Some(id) = self.links.get(token) {
                link_ids.push(id);
            }
        }

        if verb_ids.is_empty() && link_ids.is_empty() {
            None
        } else {
            Some(VectorAssociation {
                title: title.to_string(),
                verb_ids,
                link_ids,
            })
        }
    }
}

impl Extract for KeywordVectors {
    fn extract(&self, record: &Record, out: &mut Vec<Extracted>) {
        if let Some(v) = self.vectorize(&record.title, &record.text) {
            out.push(Extracted::Vector(v));
        }
    }
}
