//! File-backed CSV handle.
//!
//! A [`CsvFile`] only remembers a path and a dialect. The file is opened
//! when a reader, a writer or a line-break check is requested, so building
//! a handle for a path that does not exist yet never fails.

use std::fs::File;
use std::io::{BufWriter, Cursor, Read};
use std::path::{Path, PathBuf};

use log::debug;

use crate::dialect::Dialect;
use crate::error::{CsvError, Result};
use crate::line_break::LineBreak;
use crate::reader::Reader;
use crate::writer::Writer;

/// A CSV file on disk and the dialect to read or write it with.
///
/// # Example
///
/// ```no_run
/// use csv_frame::CsvFile;
///
/// let file = CsvFile::new("data.csv");
/// assert_eq!(file.basename(), Some("data.csv"));
///
/// file.validate_line_break().unwrap();
/// let header = file.open().unwrap().header().unwrap();
/// println!("{header:?}");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvFile {
    path: PathBuf,
    dialect: Dialect,
}

impl CsvFile {
    /// Handle for `path` with the default dialect.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self::with_dialect(path, Dialect::default())
    }

    /// Handle for `path` with a custom dialect.
    pub fn with_dialect<P: AsRef<Path>>(path: P, dialect: Dialect) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            dialect,
        }
    }

    /// Path given at construction.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Final path component, if it is valid UTF-8.
    pub fn basename(&self) -> Option<&str> {
        self.path.file_name().and_then(|name| name.to_str())
    }

    /// Dialect used to read and write the file.
    pub fn dialect(&self) -> &Dialect {
        &self.dialect
    }

    /// Shortcut for the dialect's delimiter.
    pub fn delimiter(&self) -> u8 {
        self.dialect.delimiter()
    }

    /// Shortcut for the dialect's enclosure.
    pub fn enclosure(&self) -> u8 {
        self.dialect.enclosure()
    }

    /// Shortcut for the dialect's escape byte.
    pub fn escape(&self) -> Option<u8> {
        self.dialect.escape()
    }

    /// Open the file for reading.
    ///
    /// # Errors
    ///
    /// [`CsvError::Unavailable`] if the file cannot be opened.
    pub fn open(&self) -> Result<Reader<File>> {
        let file = File::open(&self.path).map_err(|source| self.unavailable(source))?;
        debug!("opened {}", self.path.display());
        Ok(Reader::new(file, self.dialect.clone()))
    }

    /// Load the whole file and convert it to UTF-8 before reading.
    pub fn open_transcoded(&self) -> Result<Reader<Cursor<Vec<u8>>>> {
        let mut data = Vec::new();
        File::open(&self.path)
            .and_then(|mut file| file.read_to_end(&mut data))
            .map_err(|source| self.unavailable(source))?;
        debug!("loaded {} bytes from {}", data.len(), self.path.display());
        Ok(Reader::from_bytes_transcoded(&data, self.dialect.clone()))
    }

    /// Create or truncate the file and return a writer for it.
    pub fn create(&self) -> Result<Writer<BufWriter<File>>> {
        let file = File::create(&self.path).map_err(|source| self.unavailable(source))?;
        debug!("created {}", self.path.display());
        Ok(Writer::new(BufWriter::new(file), self.dialect.clone()))
    }

    /// Detect the line break ending the first row.
    pub fn line_break(&self) -> Result<LineBreak> {
        self.open()?.line_break()
    }

    /// Escaped textual form of the detected line break, e.g. `\r\n`.
    pub fn line_break_as_text(&self) -> Result<&'static str> {
        Ok(self.line_break()?.as_text())
    }

    /// Detect the line break and reject lone CR endings.
    pub fn validate_line_break(&self) -> Result<LineBreak> {
        self.line_break()?.validate()
    }

    fn unavailable(&self, source: std::io::Error) -> CsvError {
        CsvError::Unavailable {
            path: self.path.clone(),
            source,
        }
    }
}
