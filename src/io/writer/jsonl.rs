//! Append-only newline-delimited JSON file.
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use log::info;
use serde::Serialize;

use crate::error::Error;

/// Append-only JSONL writer.
///
/// Note that nothing is created/written unless a write is performed,
/// and that existing files are appended to, never truncated.
pub struct JsonlLog {
    path: PathBuf,
    file: Option<BufWriter<File>>,
    nb_lines: u64,
}

impl JsonlLog {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            file: None,
            nb_lines: 0,
        }
    }

    fn open(&mut self) -> Result<&mut BufWriter<File>, Error> {
        if self.file.is_none() {
            info!("opening {:?} (append)", self.path);
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.path)?;
            self.file = Some(BufWriter::new(file));
        }

        self.file
            .as_mut()
            .ok_or_else(|| Error::Custom(format!("could not open {:?}", self.path)))
    }

    /// Write a single record on its own line.
    pub fn write<T: Serialize>(&mut self, record: &T) -> Result<(), Error> {
        let file = self.open()?;
        serde_json::to_writer(&mut *file, record)?;
        file.write_all(b"\n")?;
        self.nb_lines += 1;
        Ok(())
    }

    /// Flush buffered lines and sync them to disk.
    pub fn flush(&mut self) -> Result<(), Error> {
        if let Some(file) = &mut self.file {
            file.flush()?;
            file.get_ref().sync_data()?;
        }
        Ok(())
    }

    /// Number of lines written by this writer (not counting pre-existing ones).
    pub fn nb_lines(&self) -> u64 {
        self.nb_lines
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use std::io::{BufRead, BufReader};

    use super::*;
    use crate::extract::VectorAssociation;

    fn read_lines(path: &Path) -> Vec<String> {
        let f = File::open(path).unwrap();
        BufReader::new(f).lines().map(Result::unwrap).collect()
    }

    #[test]
    fn lazy_creation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.jsonl");
        let mut log = JsonlLog::new(&path);
        log.flush().unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn appends_across_writers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.jsonl");
        let v = VectorAssociation {
            title: "a".to_string(),
            verb_ids: vec![1],
            link_ids: vec![2, 3],
        };

        for _ in 0..2 {
            let mut log = JsonlLog::new(&path);
            log.write(&v).unwrap();
            log.flush().unwrap();
            assert_eq!(log.nb_lines(), 1);
        }

        let lines = read_lines(&path);
        assert_eq!(lines.len(), 2);
        let back: VectorAssociation = serde_json::from_str(&lines[1]).unwrap();
        assert_eq!(back, v);
    }
}
