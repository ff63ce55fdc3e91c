//! Error enum
use std::fmt;

#[derive(Debug)]
pub enum Error {
    Io(std::io::Error),
    Serde(serde_json::Error),
    Xml(quick_xml::Error),
    Signal(ctrlc::Error),
    /// Invalid keyword index or phrase vocabulary.
    Index(String),
    /// Invalid resume request (e.g. skipping after reading has started).
    Resume(String),
    /// A pipeline channel was closed while data was still flowing.
    Channel(String),
    /// A worker panicked while extracting a batch.
    WorkerPanic(String),
    Custom(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(e) => write!(f, "io error: {e}"),
            Error::Serde(e) => write!(f, "json error: {e}"),
            Error::Xml(e) => write!(f, "xml error: {e}"),
            Error::Signal(e) => write!(f, "could not install signal handler: {e}"),
            Error::Index(msg) => write!(f, "invalid index: {msg}"),
            Error::Resume(msg) => write!(f, "invalid resume: {msg}"),
            Error::Channel(msg) => write!(f, "channel closed: {msg}"),
            Error::WorkerPanic(msg) => write!(f, "worker panicked: {msg}"),
            Error::Custom(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            Error::Serde(e) => Some(e),
            Error::Xml(e) => Some(e),
            Error::Signal(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Error {
        Error::Io(e)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Error {
        Error::Serde(e)
    }
}

impl From<quick_xml::Error> for Error {
    fn from(e: quick_xml::Error) -> Error {
        Error::Xml(e)
    }
}

impl From<ctrlc::Error> for Error {
    fn from(e: ctrlc::Error) -> Error {
        Error::Signal(e)
    }
}

impl From<String> for Error {
    fn from(s: String) -> Error {
        Error::Custom(s)
    }
}
