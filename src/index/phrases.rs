//! Known phrases vocabulary.
use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use log::info;
use serde::Deserialize;

use crate::error::Error;

/// Phrase files come either as a plain list or as a `phrase -> count` map.
#[derive(Deserialize)]
#[serde(untagged)]
enum PhraseFile {
    List(Vec<String>),
    Counts(HashMap<String, serde_json::Value>),
}

/// Set of lower-cased known phrases.
#[derive(Debug, Clone, Default)]
pub struct PhraseVocabulary {
    phrases: HashSet<String>,
    max_words: usize,
}

impl PhraseVocabulary {
    /// Load a vocabulary from either a JSON array or a JSON object (keys are used).
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref();
        let f = BufReader::new(File::open(path)?);
        let vocab = match serde_json::from_reader::<_, PhraseFile>(f)? {
            PhraseFile::List(phrases) => phrases.into_iter().collect::<Self>(),
            PhraseFile::Counts(counts) => counts.into_keys().collect::<Self>(),
        };
        if vocab.is_empty() {
            return Err(Error::Index(format!("no phrases in {:?}", path)));
        }
        info!(
            "loaded {} phrases (up to {} words) from {:?}",
            vocab.len(),
            vocab.max_words(),
            path
        );
        Ok(vocab)
    }

    /// `phrase` has to be lower-cased already.
    pub fn contains(&self, phrase: &str) -> bool {
        self.phrases.contains(phrase)
    }

    /// Word count of the longest phrase.
    pub fn max_words(&self) -> usize {
        self.max_words
    }

    pub fn len(&self) -> usize {
        self.phrases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.phrases.is_empty()
    }
}

impl<S: AsRef<str>> FromIterator<S> for PhraseVocabulary {
    /// Lower-cases and normalizes inner whitespace of each phrase.
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        let mut max_words = 0;
        let phrases = iter
            .into_iter()
            .filter_map(|phrase| {
                let words: Vec<String> = phrase
                    .as_ref()
                    .split_whitespace()
                    .map(str::to_lowercase)
                    .collect();
                if words.is_empty() {
                    None
                } else {
                    max_words = max_words.max(words.len());
                    Some(words.join(" "))
                }
            })
            .collect();
        Self { phrases, max_words }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn normalizes_entries() {
        let vocab: PhraseVocabulary = ["New  York", "city", "   "].into_iter().collect();
        assert_eq!(vocab.len(), 2);
        assert!(vocab.contains("new york"));
        assert_eq!(vocab.max_words(), 2);
    }

    #[test]
    fn load_list_and_map() {
        let mut list = tempfile::NamedTempFile::new().unwrap();
        write!(list, r#"["new york", "paris"]"#).unwrap();
        let vocab = PhraseVocabulary::from_path(list.path()).unwrap();
        assert!(vocab.contains("paris"));

        let mut map = tempfile::NamedTempFile::new().unwrap();
        write!(map, r#"{{"new york city": 12, "paris": 3}}"#).unwrap();
        let vocab = PhraseVocabulary::from_path(map.path()).unwrap();
        assert!(vocab.contains("new york city"));
        assert_eq!(vocab.max_words(), 3);
    }

    #[test]
    fn empty_vocabulary_is_an_error() {
        let mut list = tempfile::NamedTempFile::new().unwrap();
        write!(list, "[]").unwrap();
        assert!(matches!(
            PhraseVocabulary::from_path(list.path()),
            Err(Error::Index(_))
        ));
    }
}
