//! Token to id mapping.
use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use log::info;

use crate::error::Error;

/// Immutable `token -> id` vocabulary.
///
/// Ids are strictly positive and unique within an index.
#[derive(Debug, Clone, Default)]
pub struct KeywordIndex {
    ids: HashMap<String, u32>,
}

impl KeywordIndex {
    /// Build an index, checking that ids are positive and unique.
    pub fn new(ids: HashMap<String, u32>) -> Result<Self, Error> {
        let mut seen = HashSet::with_capacity(ids.len());
        for (token, id) in &ids {
            if *id == 0 {
                return Err(Error::Index(format!("token {:?} has id 0", token)));
            }
            if !seen.insert(*id) {
                return Err(Error::Index(format!(
                    "id {} is used by more than one token (one of them is {:?})",
                    id, token
                )));
            }
        }
        Ok(Self { ids })
    }

    /// Load an index from a JSON object (`{"token": id, ...}`).
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref();
        let f = BufReader::new(File::open(path)?);
        let ids: HashMap<String, u32> = serde_json::from_reader(f)?;
        let index = Self::new(ids)?;
        info!("loaded {} tokens from {:?}", index.len(), path);
        Ok(index)
    }

    pub fn get(&self, token: &str) -> Option<u32> {
        self.ids.get(token).copied()
    }

    pub fn contains(&self, token: &str) -> bool {
        self.ids.contains_key(token)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

impl<'a> FromIterator<(&'a str, u32)> for KeywordIndex {
    /// Collects without validation. Meant for tests and small literal indices.
    fn from_iter<T: IntoIterator<Item = (&'a str, u32)>>(iter: T) -> Self {
        Self {
            ids: iter
                .into_iter()
                .map(|(token, id)| (token.to_string(), id))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn rejects_zero_id() {
        let ids = [("run".to_string(), 0)].into_iter().collect();
        assert!(matches!(KeywordIndex::new(ids), Err(Error::Index(_))));
    }

    #[test]
    fn rejects_shared_ids() {
        let ids = [("run".to_string(), 3), ("walk".to_string(), 3)]
            .into_iter()
            .collect();
        assert!(matches!(KeywordIndex::new(ids), Err(Error::Index(_))));
    }

    #[test]
    fn load_from_json() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(f, r#"{{"run": 1, "walk": 2}}"#).unwrap();

        let index = KeywordIndex::from_path(f.path()).unwrap();
        assert_eq!(index.len(), 2);
        assert_eq!(index.get("walk"), Some(2));
        assert_eq!(index.get("swim"), None);
    }

    #[test]
    fn load_from_non_object() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(f, r#"["run", "walk"]"#).unwrap();
        assert!(matches!(
            KeywordIndex::from_path(f.path()),
            Err(Error::Serde(_))
        ));
    }
}
