//! Candidate phrase discovery.
//!
//! Lists every distinct window of `min_words..=max_words` words made only of
//! ASCII letters and `.,?`. Counting how many records contain each window
//! (see [crate::io::KnowledgeSink]) builds a phrase vocabulary.
use std::collections::BTreeSet;

use crate::sources::Record;

use super::{Extract, Extracted, PhraseSet};

fn is_phrase_char(c: char) -> bool {
    c.is_ascii_alphabetic() || matches!(c, '.' | ',' | '?')
}

pub struct PhraseGatherer {
    min_words: usize,
    max_words: usize,
}

impl PhraseGatherer {
    pub fn new(min_words: usize, max_words: usize) -> Self {
        Self {
            min_words: min_words.max(1),
            max_words,
        }
    }

    /// Distinct lower-cased candidate phrases, sorted.
    pub fn gather(&self, text: &str) -> BTreeSet<String> {
        let words: Vec<&str> = text.split_whitespace().collect();
        let mut phrases = BTreeSet::new();

        for first in 0..words.len() {
            let mut phrase = String::new();
            for (n, word) in words[first..].iter().take(self.max_words).enumerate() {
                // longer windows would contain the same invalid word
                if !word.chars().all(is_phrase_char) {
                    break;
                }
                if n > 0 {
                    phrase.push(' ');
                }
                phrase.push_str(word);
                if n + 1 >= self.min_words {
                    phrases.insert(phrase.to_ascii_lowercase());
                }
            }
        }
        phrases
    }
}

impl Default for PhraseGatherer {
    fn default() -> Self {
        Self::new(1, 8)
    }
}

impl Extract for PhraseGatherer {
    fn extract(&self, record: &Record, out: &mut Vec<Extracted>) {
        let phrases = self.gather(&record.text);
        if !phrases.is_empty() {
            out.push(Extracted::Phrases(PhraseSet {
                title: record.title.clone(),
                phrases: phrases.into_iter().collect(),
            }));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn windows() {
        let g = PhraseGatherer::new(1, 2);
        let found: Vec<String> = g.gather("The cat, the CAT").into_iter().collect();
        assert_eq!(
            found,
            vec!["cat", "cat,", "cat, the", "the", "the cat", "the cat,"]
        );
    }

    #[test]
    fn invalid_words_break_windows() {
        let g = PhraseGatherer::default();
        let found: Vec<String> = g.gather("born in 1990 in Paris").into_iter().collect();
        assert_eq!(found, vec!["born", "born in", "in", "in paris", "paris"]);
    }

    #[test]
    fn empty_text() {
        let mut out = Vec::new();
        PhraseGatherer::default().extract(&Record::new(0, "t".to_string(), String::new()), &mut out);
        assert!(out.is_empty());
    }
}
