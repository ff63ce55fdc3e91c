//! Records produced by extraction.
//!
//! Each output line of the pipeline logs is one of these, serialized as JSON.
use serde::{Deserialize, Serialize};

/// Keyword ids found in a record, in encounter order (duplicates kept).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VectorAssociation {
    pub title: String,
    pub verb_ids: Vec<u32>,
    pub link_ids: Vec<u32>,
}

/// First (verb, link) co-occurrence of a sentence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntersectionRecord {
    pub title: String,
    pub link_token: String,
    pub verb_token: String,
    pub sentence: String,
}

/// A known phrase and its sentence/bracket context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stretch {
    pub phrase: String,
    pub context: String,
}

/// Stretches of a single record, in acceptance order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StretchRecord {
    pub title: String,
    pub stretches: Vec<Stretch>,
}

/// Distinct candidate phrases of a single record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhraseSet {
    pub title: String,
    pub phrases: Vec<String>,
}

/// Anything an extractor can emit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Extracted {
    Vector(VectorAssociation),
    Intersection(IntersectionRecord),
    Stretches(StretchRecord),
    Phrases(PhraseSet),
}

impl Extracted {
    pub fn title(&self) -> &str {
        match self {
            Extracted::Vector(v) => &v.title,
            Extracted::Intersection(i) => &i.title,
            Extracted::Stretches(s) => &s.title,
            Extracted::Phrases(p) => &p.title,
        }
    }
}
