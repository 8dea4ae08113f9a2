//! Row-oriented reading over a seekable byte stream.

use std::io::{BufReader, Cursor, Read, Seek};
use std::iter::FusedIterator;
use std::sync::Arc;

use foldhash::{HashMap, HashMapExt};
use log::debug;

use crate::dialect::Dialect;
use crate::encoding::transcode_to_utf8;
use crate::error::{CsvError, Result};
use crate::line_break::{LineBreak, detect_from_source};
use crate::parse::source::ByteSource;
use crate::parse::tokenizer::Tokenizer;

/// One parsed row: its fields in file order.
pub type Row = Vec<String>;

/// CSV reader over any `Read + Seek` source.
///
/// Every call to [`header`](Reader::header), [`rows`](Reader::rows),
/// [`records`](Reader::records) or [`line_break`](Reader::line_break)
/// rewinds the source and scans from the beginning, so the views are
/// independent of each other. The reader never opens or closes the source.
///
/// # Example
///
/// ```
/// use csv_frame::{Dialect, Reader};
///
/// let mut reader = Reader::from_bytes("id,name\n1,\"Smith, J\"\n", Dialect::default());
/// assert_eq!(reader.header().unwrap(), vec!["id", "name"]);
///
/// let rows: Vec<_> = reader.rows().unwrap().collect::<Result<_, _>>().unwrap();
/// assert_eq!(rows[1], vec!["1", "Smith, J"]);
/// ```
#[derive(Debug)]
pub struct Reader<S> {
    source: S,
    dialect: Dialect,
}

impl<S: Read + Seek> Reader<S> {
    /// Create a reader. Nothing is read until the first scan.
    pub fn new(source: S, dialect: Dialect) -> Self {
        Self { source, dialect }
    }

    /// The dialect used for parsing.
    pub fn dialect(&self) -> &Dialect {
        &self.dialect
    }

    /// The first row, or an empty row if the stream has none.
    pub fn header(&mut self) -> Result<Row> {
        let mut rows = self.rows()?;
        Ok(rows.next().transpose()?.unwrap_or_default())
    }

    /// Scan rows lazily from the start of the stream.
    pub fn rows(&mut self) -> Result<Rows<'_, S>> {
        self.source.rewind()?;
        let mut src = ByteSource::new(BufReader::new(&mut self.source));
        if src.skip_bom()? {
            debug!("skipped UTF-8 byte order mark");
        }
        Ok(Rows {
            tokenizer: Tokenizer::new(src, &self.dialect),
            done: false,
        })
    }

    /// Scan data rows keyed by the header row.
    ///
    /// The first row becomes the header and is not yielded itself.
    ///
    /// # Errors
    ///
    /// [`CsvError::DuplicateHeader`] if a column name repeats.
    pub fn records(&mut self) -> Result<Records<'_, S>> {
        let mut rows = self.rows()?;
        let header = rows.next().transpose()?.unwrap_or_default();
        Ok(Records {
            header: Arc::new(HeaderIndex::new(header)?),
            rows,
        })
    }

    /// Detect the line break that ends the first row.
    pub fn line_break(&mut self) -> Result<LineBreak> {
        self.source.rewind()?;
        let mut src = ByteSource::new(BufReader::new(&mut self.source));
        detect_from_source(&mut src, &self.dialect)
    }

    /// Detect the line break and reject lone CR endings.
    ///
    /// Row iteration never validates on its own; callers opt in here.
    pub fn validate_line_break(&mut self) -> Result<LineBreak> {
        self.line_break()?.validate()
    }

    /// Unwrap the underlying source.
    pub fn into_inner(self) -> S {
        self.source
    }
}

impl Reader<Cursor<Vec<u8>>> {
    /// Read from an in-memory buffer.
    pub fn from_bytes(data: impl Into<Vec<u8>>, dialect: Dialect) -> Self {
        Self::new(Cursor::new(data.into()), dialect)
    }

    /// Read from a buffer in any encoding, converting it to UTF-8 first.
    pub fn from_bytes_transcoded(data: &[u8], dialect: Dialect) -> Self {
        let (utf8, encoding) = transcode_to_utf8(data);
        debug!("decoding input as {}", encoding.name());
        Self::from_bytes(utf8.into_owned(), dialect)
    }

    /// Download a CSV and read it from memory.
    ///
    /// Downloads larger than `max_bytes` are refused.
    #[cfg(feature = "http")]
    pub fn from_url(url: &str, max_bytes: Option<usize>, dialect: Dialect) -> Result<Self> {
        let data = crate::http::fetch_url(url, max_bytes)?;
        Ok(Self::from_bytes(data, dialect))
    }
}

/// Lazy, forward-only row iterator returned by [`Reader::rows`].
///
/// Once it yields `None` or an error it stays exhausted.
#[derive(Debug)]
pub struct Rows<'a, S> {
    tokenizer: Tokenizer<BufReader<&'a mut S>>,
    done: bool,
}

impl<S: Read> Rows<'_, S> {
    /// Physical line of the next unread byte.
    pub fn line(&self) -> u64 {
        self.tokenizer.line()
    }

    /// Number of rows yielded so far.
    pub fn rows_read(&self) -> u64 {
        self.tokenizer.rows_read()
    }
}

impl<S: Read> Iterator for Rows<'_, S> {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.tokenizer.next_row() {
            Ok(Some(row)) => Some(Ok(row)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

impl<S: Read> FusedIterator for Rows<'_, S> {}

/// Column names of a header row and their positions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderIndex {
    names: Row,
    positions: HashMap<String, usize>,
}

impl HeaderIndex {
    /// Index a header row.
    ///
    /// # Errors
    ///
    /// [`CsvError::DuplicateHeader`] if a name occurs twice.
    pub fn new(names: Row) -> Result<Self> {
        let mut positions = HashMap::with_capacity(names.len());
        for (i, name) in names.iter().enumerate() {
            if positions.insert(name.clone(), i).is_some() {
                return Err(CsvError::DuplicateHeader(name.clone()));
            }
        }
        Ok(Self { names, positions })
    }

    /// Position of the named column.
    #[inline]
    pub fn position(&self, name: &str) -> Option<usize> {
        self.positions.get(name).copied()
    }

    /// Column names in header order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// True when the header row had no columns.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// A data row paired with the header it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    header: Arc<HeaderIndex>,
    fields: Row,
}

impl Record {
    /// Value of the named column; `None` if the column is unknown or the
    /// row is shorter than the header.
    pub fn get(&self, name: &str) -> Option<&str> {
        let position = self.header.position(name)?;
        self.fields.get(position).map(String::as_str)
    }

    /// Raw fields, including any beyond the header's width.
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Drop the header and keep the raw fields.
    pub fn into_fields(self) -> Row {
        self.fields
    }

    /// `(column, value)` pairs for columns present in both header and row.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.header
            .names()
            .iter()
            .zip(&self.fields)
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }
}

/// Header-keyed iterator returned by [`Reader::records`].
#[derive(Debug)]
pub struct Records<'a, S> {
    header: Arc<HeaderIndex>,
    rows: Rows<'a, S>,
}

impl<S: Read> Records<'_, S> {
    /// The header this iterator keys records by.
    pub fn header(&self) -> &HeaderIndex {
        &self.header
    }
}

impl<S: Read> Iterator for Records<'_, S> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        let fields = match self.rows.next()? {
            Ok(fields) => fields,
            Err(e) => return Some(Err(e)),
        };
        Some(Ok(Record {
            header: Arc::clone(&self.header),
            fields,
        }))
    }
}

impl<S: Read> FusedIterator for Records<'_, S> {}
