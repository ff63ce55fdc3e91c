/*! Corpus sources.

A source yields [Record]s one at a time, in document order.
!*/
mod wikidump;

pub use wikidump::WikiDump;

/// One corpus entry.
///
/// `offset` is the 0-based position of the record in the dump,
/// counting every page (including malformed and skipped ones).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub offset: u64,
    pub title: String,
    pub text: String,
}

impl Record {
    pub fn new(offset: u64, title: String, text: String) -> Self {
        Self {
            offset,
            title,
            text,
        }
    }
}
