use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::line_break::LineBreak;

/// Error type for CSV reading, writing and validation.
#[derive(Error, Debug)]
pub enum CsvError {
    /// IO error on the underlying stream or sink.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// The file backing a `CsvFile` could not be opened or created.
    #[error("Cannot open {}: {source}", path.display())]
    Unavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The stream ended inside an enclosed field.
    #[error("Malformed CSV: enclosure opened on line {line} is never closed")]
    UnterminatedEnclosure { line: u64 },

    /// Line-break validation rejected the detected terminator.
    #[error("Invalid line break: {0} line endings are not supported")]
    InvalidLineBreak(LineBreak),

    /// A row is not valid UTF-8.
    #[error("Invalid UTF-8 in row ending on line {line}")]
    InvalidUtf8 { line: u64 },

    /// Invalid dialect configuration.
    #[error("Invalid dialect: {0}")]
    InvalidDialect(String),

    /// The header row names the same column twice.
    #[error("Duplicate header column: {0:?}")]
    DuplicateHeader(String),

    /// Remote fetch failed.
    #[cfg(feature = "http")]
    #[error("HTTP error: {0}")]
    Http(#[from] crate::http::HttpError),
}

/// Result type alias for CSV operations.
pub type Result<T> = std::result::Result<T, CsvError>;
