//! Greedy longest-match phrase extraction.
//!
//! Every window of `min_words..=stretch_max` words is looked up in a [PhraseVocabulary].
//! Matches are then accepted longest first, skipping those that overlap an already accepted one,
//! and each accepted phrase gets its surrounding context:
//! the text between the closest delimiter before (`. ? ! [ {`) and after (`. ? ! ] }`) it.
//!
//! ```text
//! vocabulary: {"new york", "new york city"}
//! text:       "I live in new york city"
//! accepted:   "new york city" -> "I live in new york city"
//! ```
//!
//! Spans are tracked per window, so a phrase occurring twice is bound to the right occurrence.
use std::collections::HashSet;
use std::sync::Arc;

use crate::index::PhraseVocabulary;
use crate::sources::Record;

use super::{Extract, Extracted, Stretch, StretchRecord};

const CONTEXT_START: [char; 5] = ['.', '?', '!', '[', '{'];
const CONTEXT_END: [char; 5] = ['.', '?', '!', ']', '}'];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatcherConfig {
    pub min_words: usize,
    pub stretch_max: usize,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            min_words: 1,
            stretch_max: 8,
        }
    }
}

/// A vocabulary match with its byte span in the source text.
struct Candidate {
    key: String,
    start: usize,
    end: usize,
    nb_chars: usize,
}

pub struct StretchMatcher {
    vocabulary: Arc<PhraseVocabulary>,
    config: MatcherConfig,
}

impl StretchMatcher {
    pub fn new(vocabulary: Arc<PhraseVocabulary>, config: MatcherConfig) -> Self {
        Self { vocabulary, config }
    }

    /// Find non-overlapping known phrases, longest first.
    ///
    /// Returned stretches are in acceptance order, and a phrase is returned at most once.
    pub fn find(&self, text: &str) -> Vec<Stretch> {
        self.accept(text)
            .into_iter()
            .map(|candidate| Stretch {
                context: context(text, candidate.start, candidate.end),
                phrase: candidate.key,
            })
            .collect()
    }

    fn accept(&self, text: &str) -> Vec<Candidate> {
        let mut candidates = self.candidates(text);

        // stable: equal lengths keep scan order
        candidates.sort_by(|a, b| b.nb_chars.cmp(&a.nb_chars));

        // every non-overlapping occurrence claims its span, repeats included
        let mut used: Vec<(usize, usize)> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();
        let mut accepted: Vec<Candidate> = Vec::new();
        for candidate in candidates {
            if used
                .iter()
                .any(|&(start, end)| candidate.start < end && candidate.end > start)
            {
                continue;
            }
            used.push((candidate.start, candidate.end));
            if seen.insert(candidate.key.clone()) {
                accepted.push(candidate);
            }
        }
        accepted
    }

    fn candidates(&self, text: &str) -> Vec<Candidate> {
        let words = word_spans(text);
        let max_words = self.config.stretch_max.min(self.vocabulary.max_words());
        let min_words = self.config.min_words.max(1);

        let mut candidates = Vec::new();
        for first in 0..words.len() {
            let mut phrase = String::new();
            for (n, &(start, end)) in words[first..].iter().take(max_words).enumerate() {
                if n > 0 {
                    phrase.push(' ');
                }
                phrase.push_str(&text[start..end]);
                if n + 1 < min_words {
                    continue;
                }

                let key = phrase.to_lowercase();
                if self.vocabulary.contains(&key) {
                    candidates.push(Candidate {
                        key,
                        start: words[first].0,
                        end,
                        nb_chars: phrase.chars().count(),
                    });
                }
            }
        }
        candidates
    }
}

/// Byte spans of whitespace-separated words.
fn word_spans(text: &str) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let mut start = None;
    for (idx, c) in text.char_indices() {
        match (c.is_whitespace(), start) {
            (true, Some(s)) => {
                spans.push((s, idx));
                start = None;
            }
            (false, None) => start = Some(idx),
            _ => (),
        }
    }
    if let Some(s) = start {
        spans.push((s, text.len()));
    }
    spans
}

/// Context around `text[start..end]`.
///
/// A leading `.?!` is excluded while a leading bracket is kept.
/// The trailing delimiter is included. Missing delimiters extend to the string boundaries.
fn context(text: &str, start: usize, end: usize) -> String {
    let before = &text[..start];
    let from = match before.rfind(CONTEXT_START) {
        None => 0,
        Some(idx) if matches!(before.as_bytes()[idx], b'[' | b'{') => idx,
        Some(idx) => idx + 1,
    };

    let to = match text[end..].find(CONTEXT_END) {
        None => text.len(),
        Some(idx) => end + idx + 1,
    };

    text[from..to].trim().to_string()
}

/// Applies a [StretchMatcher] on every non-redirect record.
pub struct StretchExtractor {
    matcher: StretchMatcher,
}

impl StretchExtractor {
    pub fn new(vocabulary: Arc<PhraseVocabulary>, config: MatcherConfig) -> Self {
        Self {
            matcher: StretchMatcher::new(vocabulary, config),
        }
    }
}

fn is_redirect(text: &str) -> bool {
    text.trim_start()
        .get(..9)
        .map_or(false, |head| head.eq_ignore_ascii_case("#redirect"))
}

impl Extract for StretchExtractor {
    fn extract(&self, record: &Record, out: &mut Vec<Extracted>) {
        if record.text.is_empty() || is_redirect(&record.text) {
            return;
        }
        let stretches = self.matcher.find(&record.text);
        if !stretches.is_empty() {
            out.push(Extracted::Stretches(StretchRecord {
                title: record.title.clone(),
                stretches,
            }));
        }
    }
}
