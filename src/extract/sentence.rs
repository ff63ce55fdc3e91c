//! Sentence splitting and normalization.
//!
//! Splitting is a plain punctuation split on `.`, `!` and `?`:
//! abbreviations and decimals will produce spurious boundaries.
use std::borrow::Cow;

use itertools::Itertools;
use lazy_static::lazy_static;
use regex::{Captures, Regex};

lazy_static! {
    pub(crate) static ref LINK: Regex = Regex::new(r"\[\[(.+?)\]\]").unwrap();
}

/// Split on sentence-final punctuation. Pieces may be empty or whitespace only.
pub fn split_sentences(text: &str) -> impl Iterator<Item = &str> {
    text.split(['.', '!', '?'])
}

/// Matching form of a sentence.
///
/// Lower-cases, replaces anything outside `[a-z0-9.,?]` by a space and collapses whitespace.
pub fn normalize(sentence: &str) -> String {
    let lowered: String = sentence
        .to_lowercase()
        .chars()
        .map(|c| match c {
            'a'..='z' | '0'..='9' | '.' | ',' | '?' => c,
            _ => ' ',
        })
        .collect();
    collapse_whitespace(&lowered)
}

/// Replace `[[target|label]]` by `label` and `[[target]]` by `target`, collapsing whitespace.
pub fn render_links(sentence: &str) -> String {
    let rendered: Cow<str> = LINK.replace_all(sentence, |caps: &Captures| {
        caps[1].rsplit('|').next().unwrap_or_default().to_string()
    });
    collapse_whitespace(&rendered)
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().join(" ")
}
