//! Resume offsets.
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Number of source records whose output is durable.
///
/// Resuming means skipping exactly `records_consumed` records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub records_consumed: u64,
    /// Unix timestamp (seconds) of the last update. Informational only.
    #[serde(default)]
    pub updated_at: u64,
}

impl Checkpoint {
    pub fn new(records_consumed: u64) -> Self {
        let updated_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        Self {
            records_consumed,
            updated_at,
        }
    }

    pub fn load(path: &Path) -> Result<Self, Error> {
        let f = BufReader::new(File::open(path)?);
        Ok(serde_json::from_reader(f)?)
    }

    /// Load if `path` exists.
    pub fn load_opt(path: &Path) -> Result<Option<Self>, Error> {
        if path.exists() {
            Self::load(path).map(Some)
        } else {
            Ok(None)
        }
    }

    /// Atomically replace the checkpoint file: write to a sibling then rename.
    pub fn save(&self, path: &Path) -> Result<(), Error> {
        let tmp = tmp_path(path);
        {
            let mut f = File::create(&tmp)?;
            serde_json::to_writer(&mut f, self)?;
            f.write_all(b"\n")?;
            f.sync_all()?;
        }
        std::fs::rename(&tmp, path)?;
        debug!("checkpoint {} saved to {:?}", self.records_consumed, path);
        Ok(())
    }
}

pub(crate) fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Tracks out-of-order completion of contiguous record ranges.
///
/// The offset only advances once every range below it has completed.
#[derive(Debug, Clone, Default)]
pub struct Watermark {
    offset: u64,
    pending: BTreeMap<u64, u64>,
}

impl Watermark {
    pub fn new(offset: u64) -> Self {
        Self {
            offset,
            pending: BTreeMap::new(),
        }
    }

    /// Mark `[start, end)` as complete. Returns `true` if the offset advanced.
    pub fn complete(&mut self, start: u64, end: u64) -> bool {
        if end <= self.offset {
            return false;
        }
        self.pending.insert(start, end);

        let before = self.offset;
        while let Some(end) = self.pending.remove(&self.offset) {
            self.offset = end;
        }
        self.offset > before
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Number of completed ranges waiting for an earlier one.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn watermark_in_order() {
        let mut w = Watermark::new(0);
        assert!(w.complete(0, 10));
        assert!(w.complete(10, 20));
        assert_eq!(w.offset(), 20);
    }

    #[test]
    fn watermark_out_of_order() {
        let mut w = Watermark::new(100);
        assert!(!w.complete(110, 120));
        assert!(!w.complete(120, 125));
        assert_eq!(w.offset(), 100);
        assert_eq!(w.pending(), 2);

        assert!(w.complete(100, 110));
        assert_eq!(w.offset(), 125);
        assert_eq!(w.pending(), 0);
    }

    #[test]
    fn watermark_gap_holds() {
        let mut w = Watermark::new(0);
        w.complete(0, 5);
        // [5, 10) is lost
        w.complete(10, 15);
        assert_eq!(w.offset(), 5);
    }

    #[test]
    fn save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("checkpoint.json");

        assert_eq!(Checkpoint::load_opt(&path).unwrap(), None);

        Checkpoint::new(42).save(&path).unwrap();
        Checkpoint::new(43).save(&path).unwrap();
        let cp = Checkpoint::load(&path).unwrap();
        assert_eq!(cp.records_consumed, 43);
        assert!(!tmp_path(&path).exists());
    }
}
