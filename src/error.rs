//! Error type shared by the library modules.

use std::path::PathBuf;

/// Errors raised by marker editing, document sessions and settings stores.
///
/// Rendering itself never fails: unreadable sources degrade to an
/// error-content document instead of surfacing one of these.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("comment range is empty or reversed: {start}..{end}")]
    InvalidRange { start: usize, end: usize },

    #[error("offset {offset} is past the end of the source ({len} bytes)")]
    OffsetOutOfBounds { offset: usize, len: usize },

    #[error("offset {offset} does not fall on a UTF-8 character boundary")]
    NotCharBoundary { offset: usize },

    #[error("offset {offset} falls inside an existing comment marker")]
    OffsetInsideMarker { offset: usize },

    #[error("no document is open")]
    NoDocument,

    #[error("no comment id is left after {max}")]
    IdsExhausted { max: u64 },

    #[error("comment {0} not found")]
    CommentNotFound(String),

    #[error("failed to encode comment {id}: {source}")]
    Encode {
        id: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("settings error: {0}")]
    Settings(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result alias for library operations.
pub type Result<T> = std::result::Result<T, Error>;
