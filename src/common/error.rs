use std::fmt;

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced across the buffer pool / table handle boundary.
///
/// Variants are grouped the way spec.md's error handling design groups
/// them: domain errors that abort the current operation, and one fatal,
/// startup-only variant. "Expected, recoverable" conditions (unpin on an
/// unknown page, delete on a pinned page, flush on an unknown page) are
/// NOT represented here -- those surface as plain `bool`/`Option` returns.
#[derive(Debug)]
pub enum Error {
    /// No frame is free and every bound frame is pinned.
    NoFreeFrame,
    /// A page id referenced by a caller does not correspond to an
    /// allocated page.
    PageMiss { page_id: i32 },
    /// The slot addressed by a RID is not live.
    RecordMiss { page_id: i32, slot_id: i32 },
    /// An insert targeted a slot that is already live.
    RecordExists { page_id: i32, slot_id: i32 },
    /// The configured replacer name does not match a known implementation.
    /// Fatal: callers should treat this as a process-startup defect.
    UnknownReplacer(String),
    /// An index was out of the bounds of a row or schema.
    OutOfBounds,
    /// A value did not satisfy the constraints of its destination.
    InvalidInput(String),
    /// Wraps a lower-level disk I/O failure.
    Io(std::io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::NoFreeFrame => write!(f, "no free frame available in buffer pool"),
            Error::PageMiss { page_id } => write!(f, "page {page_id} is not allocated"),
            Error::RecordMiss { page_id, slot_id } => {
                write!(f, "no record at page {page_id} slot {slot_id}")
            }
            Error::RecordExists { page_id, slot_id } => {
                write!(f, "record already exists at page {page_id} slot {slot_id}")
            }
            Error::UnknownReplacer(name) => write!(f, "unknown replacer: {name}"),
            Error::OutOfBounds => write!(f, "index out of bounds"),
            Error::InvalidInput(msg) => write!(f, "invalid input: {msg}"),
            Error::Io(err) => write!(f, "disk i/o error: {err}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}
