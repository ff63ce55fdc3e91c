//! Streaming reader over MediaWiki XML exports.
//!
//! Each `<page>` element is a record. The title is the `<title>` child of the page,
//! the text is the `<text>` child of `<revision>`.
//!
//! Only the page currently being parsed is held in memory: the event buffer is
//! cleared after each event and nothing from previous pages is retained.
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use flate2::read::MultiGzDecoder;
use log::{debug, warn};
use quick_xml::events::Event;
use quick_xml::Reader;

use super::Record;
use crate::error::Error;

/// What a page turned out to be once its closing tag was reached.
enum Page {
    Record(Record),
    Malformed { offset: u64, reason: String },
    Skipped,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Capture {
    Nothing,
    Title,
    Text,
}

/// MediaWiki dump reader, generic over reader type.
pub struct WikiDump<R: BufRead> {
    reader: Reader<R>,
    buf: Vec<u8>,
    consumed: u64,
    malformed: u64,
    started: bool,
    finished: bool,
}

impl WikiDump<Box<dyn BufRead + Send>> {
    /// Open a dump file.
    ///
    /// Files ending in `.gz` are decompressed on the fly using a [MultiGzDecoder].
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let reader: Box<dyn BufRead + Send> =
            if path.extension().and_then(|e| e.to_str()) == Some("gz") {
                debug!("opening {:?} as gzipped dump", path);
                Box::new(BufReader::new(MultiGzDecoder::new(file)))
            } else {
                Box::new(BufReader::new(file))
            };

        Ok(Self::new(reader))
    }
}

impl<R: BufRead> WikiDump<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader: Reader::from_reader(reader),
            buf: Vec::new(),
            consumed: 0,
            malformed: 0,
            started: false,
            finished: false,
        }
    }

    /// Number of pages read from the dump so far (skipped, malformed and yielded).
    pub fn consumed(&self) -> u64 {
        self.consumed
    }

    /// Number of pages that were dropped because they could not be parsed.
    pub fn skipped_malformed(&self) -> u64 {
        self.malformed
    }

    /// Discard the first `n` pages without building their content.
    ///
    /// Must be called before the first call to [Iterator::next].
    /// Returns the number of pages actually skipped, which is lower than `n`
    /// if the dump ends first.
    pub fn skip_records(&mut self, n: u64) -> Result<u64, Error> {
        if self.started {
            return Err(Error::Resume(format!(
                "cannot skip {} records: {} records already read",
                n, self.consumed
            )));
        }

        let mut skipped = 0;
        while skipped < n {
            match self.next_page(false)? {
                Some(_) => skipped += 1,
                None => {
                    warn!("dump ended after skipping {} of {} records", skipped, n);
                    self.finished = true;
                    break;
                }
            }
        }
        Ok(skipped)
    }

    /// Read events until the next page has been closed.
    ///
    /// When `build` is false, the page is only scanned for its boundary.
    fn next_page(&mut self, build: bool) -> Result<Option<Page>, Error> {
        // find the next <page>
        loop {
            self.buf.clear();
            match self.reader.read_event_into(&mut self.buf)? {
                Event::Start(e) if e.local_name().as_ref() == b"page" => break,
                Event::Eof => return Ok(None),
                _ => (),
            }
        }

        let offset = self.consumed;
        let mut depth = 1usize;
        let mut revision_depth: Option<usize> = None;
        let mut capture = Capture::Nothing;
        let mut capture_depth = 0usize;
        let mut title: Option<String> = None;
        let mut text = String::new();
        let mut malformed: Option<String> = None;

        loop {
            self.buf.clear();
            match self.reader.read_event_into(&mut self.buf)? {
                Event::Start(e) => {
                    depth += 1;
                    if !build {
                        continue;
                    }
                    match e.local_name().as_ref() {
                        b"title" if depth == 2 => {
                            capture = Capture::Title;
                            capture_depth = depth;
                            title = Some(String::new());
                        }
                        b"revision" if depth == 2 && revision_depth.is_none() => {
                            revision_depth = Some(depth);
                        }
                        b"text" if revision_depth == Some(depth - 1) => {
                            capture = Capture::Text;
                            capture_depth = depth;
                        }
                        _ => (),
                    }
                }
                Event::End(_) => {
                    if depth == 1 {
                        // </page>
                        break;
                    }
                    if capture != Capture::Nothing && depth == capture_depth {
                        capture = Capture::Nothing;
                    }
                    if revision_depth == Some(depth) {
                        // only the first revision is kept
                        revision_depth = Some(usize::MAX);
                    }
                    depth -= 1;
                }
                Event::Empty(e) => {
                    if build && e.local_name().as_ref() == b"title" && depth == 1 {
                        title = Some(String::new());
                    }
                }
                Event::Text(e) => {
                    if !build || capture == Capture::Nothing {
                        continue;
                    }
                    match e.unescape() {
                        Ok(chunk) => match capture {
                            Capture::Title => {
                                if let Some(t) = title.as_mut() {
                                    t.push_str(&chunk)
                                }
                            }
                            Capture::Text => text.push_str(&chunk),
                            Capture::Nothing => (),
                        },
                        Err(e) => malformed = Some(format!("could not unescape content: {}", e)),
                    }
                }
                Event::CData(e) => {
                    if !build || capture == Capture::Nothing {
                        continue;
                    }
                    let chunk = e.into_inner();
                    let chunk = String::from_utf8_lossy(&chunk);
                    match capture {
                        Capture::Title => {
                            if let Some(t) = title.as_mut() {
                                t.push_str(&chunk)
                            }
                        }
                        Capture::Text => text.push_str(&chunk),
                        Capture::Nothing => (),
                    }
                }
                Event::Eof => {
                    return Err(Error::Custom(format!(
                        "dump ended inside record {} (byte {})",
                        offset,
                        self.reader.buffer_position()
                    )));
                }
                _ => (),
            }
        }

        self.consumed += 1;

        if !build {
            return Ok(Some(Page::Skipped));
        }

        if let Some(reason) = malformed {
            return Ok(Some(Page::Malformed { offset, reason }));
        }

        match title {
            Some(title) if !title.trim().is_empty() => {
                Ok(Some(Page::Record(Record::new(offset, title, text))))
            }
            _ => Ok(Some(Page::Malformed {
                offset,
                reason: "missing title".to_string(),
            })),
        }
    }
}

impl<R: BufRead> Iterator for WikiDump<R> {
    type Item = Result<Record, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        self.started = true;
        if self.finished {
            return None;
        }

        loop {
            match self.next_page(true) {
                Ok(Some(Page::Record(record))) => return Some(Ok(record)),
                Ok(Some(Page::Malformed { offset, reason })) => {
                    warn!("skipping malformed record {}: {}", offset, reason);
                    self.malformed += 1;
                }
                Ok(Some(Page::Skipped)) => (),
                Ok(None) => {
                    self.finished = true;
                    return None;
                }
                Err(e) => {
                    self.finished = true;
                    return Some(Err(e));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DUMP: &str = r#"<mediawiki xmlns="http://www.mediawiki.org/xml/export-0.10/" version="0.10">
  <siteinfo>
    <sitename>Wikipedia</sitename>
  </siteinfo>
  <page>
    <title>Paris</title>
    <ns>0</ns>
    <revision>
      <id>1</id>
      <text bytes="42" xml:space="preserve">Paris is the capital of [[France]] &amp; more.</text>
    </revision>
  </page>
  <page>
    <title>Empty</title>
    <revision>
      <text bytes="0" />
    </revision>
  </page>
  <page>
    <ns>0</ns>
    <revision><text>no title here</text></revision>
  </page>
  <page>
    <title>Last</title>
    <revision><text><![CDATA[raw <b>text</b>]]></text></revision>
  </page>
</mediawiki>"#;

    fn dump() -> WikiDump<&'static [u8]> {
        WikiDump::new(DUMP.as_bytes())
    }

    #[test]
    fn reads_records_in_order() {
        let records: Vec<Record> = dump().map(Result::unwrap).collect();
        let titles: Vec<&str> = records.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["Paris", "Empty", "Last"]);
        assert_eq!(
            records[0].text,
            "Paris is the capital of [[France]] & more."
        );
        assert_eq!(records[1].text, "");
        assert_eq!(records[2].text, "raw <b>text</b>");
    }

    #[test]
    fn offsets_count_malformed_pages() {
        let mut d = dump();
        let offsets: Vec<u64> = d.by_ref().map(|r| r.unwrap().offset).collect();
        assert_eq!(offsets, vec![0, 1, 3]);
        assert_eq!(d.skipped_malformed(), 1);
        assert_eq!(d.consumed(), 4);
    }

    #[test]
    fn skip_ahead() {
        let mut d = dump();
        assert_eq!(d.skip_records(2).unwrap(), 2);
        let titles: Vec<String> = d.map(|r| r.unwrap().title).collect();
        assert_eq!(titles, vec!["Last".to_string()]);
    }

    #[test]
    fn skip_past_end() {
        let mut d = dump();
        assert_eq!(d.skip_records(10).unwrap(), 4);
        assert!(d.next().is_none());
    }

    #[test]
    fn skip_after_read_is_an_error() {
        let mut d = dump();
        d.next();
        assert!(matches!(d.skip_records(1), Err(Error::Resume(_))));
    }

    #[test]
    fn truncated_dump_is_fatal() {
        let truncated = "<mediawiki><page><title>A</title><revision><text>abc";
        let mut d = WikiDump::new(truncated.as_bytes());
        assert!(matches!(d.next(), Some(Err(_))));
        assert!(d.next().is_none());
    }
}
