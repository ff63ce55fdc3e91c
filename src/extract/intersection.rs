//! Verb/link intersection pass.
//!
//! For each sentence, reports the first verb and the first link reference seen
//! while scanning left to right. Later co-occurrences in the same sentence are ignored.
//!
//! Matching happens on single normalized words: multi-word link references never match.
use std::collections::HashMap;
use std::sync::Arc;

use crate::index::KeywordIndex;
use crate::sources::Record;

use super::sentence::{normalize, render_links, split_sentences, LINK};
use super::{Extract, Extracted, IntersectionRecord};

const ASSET_PREFIXES: &[&str] = &["file:", "image:"];
const ASSET_SUFFIXES: &[&str] = &[".png", ".jpg", ".jpeg", ".gif", ".svg"];

fn is_asset(reference: &str) -> bool {
    let lowered = reference.to_lowercase();
    ASSET_PREFIXES.iter().any(|p| lowered.starts_with(p))
        || ASSET_SUFFIXES.iter().any(|s| lowered.ends_with(s))
}

/// Link references of a text, in order of appearance.
///
/// Only the part before the first `|` is kept. Asset links (files, images) are discarded.
pub fn link_references(text: &str) -> Vec<&str> {
    LINK.captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().split('|').next().unwrap_or_default())
        .filter(|reference| !reference.is_empty() && !is_asset(reference))
        .collect()
}

pub struct Intersections {
    verbs: Arc<KeywordIndex>,
}

impl Intersections {
    pub fn new(verbs: Arc<KeywordIndex>) -> Self {
        Self { verbs }
    }

    pub fn intersect(&self, title: &str, text: &str) -> Vec<IntersectionRecord> {
        let references = link_references(text);
        if references.is_empty() {
            return Vec::new();
        }

        // lower-cased form -> first reference seen with that form
        let mut by_lowered: HashMap<String, &str> = HashMap::with_capacity(references.len());
        for reference in references {
            by_lowered
                .entry(reference.to_lowercase())
                .or_insert(reference);
        }

        let mut found = Vec::new();
        for sentence in split_sentences(text) {
            let normalized = normalize(sentence);
            let mut verb: Option<&str> = None;
            let mut link: Option<&str> = None;

            for word in normalized.split(' ') {
                let word = word.trim_matches(|c| matches!(c, ',' | '.' | '?'));
                if word.is_empty() {
                    continue;
                }
                if verb.is_none() && self.verbs.contains(word) {
                    verb = Some(word);
                }
                if link.is_none() {
                    link = by_lowered.get(word).copied();
                }
                if let (Some(verb), Some(link)) = (verb, link) {
                    found.push(IntersectionRecord {
                        title: title.to_string(),
                        link_token: link.to_string(),
                        verb_token: verb.to_string(),
                        sentence: render_links(sentence),
                    });
                    break;
                }
            }
        }
        found
    }
}

impl Extract for Intersections {
    fn extract(&self, record: &Record, out: &mut Vec<Extracted>) {
        out.extend(
            self.intersect(&record.title, &record.text)
                .into_iter()
                .map(Extracted::Intersection),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn intersections() -> Intersections {
        let verbs: KeywordIndex = [("live", 1), ("visit", 2), ("born", 3)]
            .into_iter()
            .collect();
        Intersections::new(Arc::new(verbs))
    }

    #[test]
    fn references() {
        let text = "See [[Paris]], [[France|the country]], [[File:Map.png|thumb]], \
                    [[Image:x]], [[photo.JPG]] and [[Lyon]].";
        assert_eq!(link_references(text), vec!["Paris", "France", "Lyon"]);
    }

    #[test]
    fn paris() {
        let found = intersections().intersect("Me", "I live in [[Paris]], France.");
        assert_eq!(
            found,
            vec![IntersectionRecord {
                title: "Me".to_string(),
                link_token: "Paris".to_string(),
                verb_token: "live".to_string(),
                sentence: "I live in Paris, France".to_string(),
            }]
        );
    }

    #[test]
    fn first_match_wins() {
        let text = "[[Lyon]] is where I live and visit [[Paris]]. Born in [[Nice]]!";
        let found = intersections().intersect("t", text);
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].link_token, "Lyon");
        assert_eq!(found[0].verb_token, "live");
        assert_eq!(found[1].link_token, "Nice");
        assert_eq!(found[1].verb_token, "born");
    }

    #[test]
    fn needs_both() {
        let found = intersections().intersect("t", "I live here. [[Paris]] is nice.");
        assert!(found.is_empty());
        assert!(intersections().intersect("t", "I live in Paris.").is_empty());
    }

    #[test]
    fn asset_references_do_not_match() {
        let found = intersections().intersect("t", "I live in [[File:paris]] paris.");
        assert!(found.is_empty());
    }
}
