//! Enclosure-aware tokenizer turning a byte stream into rows.

use std::io::BufRead;

use log::trace;

use super::source::ByteSource;
use crate::dialect::Dialect;
use crate::error::{CsvError, Result};
use crate::reader::Row;

/// Scanner state for the field currently being read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldState {
    /// Nothing consumed for this field yet.
    Start,
    /// Reading literal bytes up to the next delimiter or line break.
    Unenclosed,
    /// Inside an enclosure; delimiters and line breaks are content.
    Enclosed,
}

/// Splits a byte stream into rows of string fields.
///
/// Rows end on `\n` or `\r\n` outside an enclosure. A lone `\r` is field
/// content. Blank lines produce no row.
#[derive(Debug)]
pub struct Tokenizer<R> {
    src: ByteSource<R>,
    delimiter: u8,
    enclosure: u8,
    escape: Option<u8>,
    /// Decoded bytes of the current row, all fields concatenated.
    buf: Vec<u8>,
    /// End offset in `buf` of each completed field.
    ends: Vec<usize>,
    rows_read: u64,
}

impl<R: BufRead> Tokenizer<R> {
    /// Create a tokenizer reading from `src` with the framing bytes of `dialect`.
    pub fn new(src: ByteSource<R>, dialect: &Dialect) -> Self {
        Self {
            src,
            delimiter: dialect.delimiter(),
            enclosure: dialect.enclosure(),
            escape: dialect.escape(),
            buf: Vec::with_capacity(256),
            ends: Vec::with_capacity(16),
            rows_read: 0,
        }
    }

    /// Physical line of the next unread byte.
    #[inline]
    pub fn line(&self) -> u64 {
        self.src.line()
    }

    /// Number of rows produced so far.
    #[inline]
    pub fn rows_read(&self) -> u64 {
        self.rows_read
    }

    /// Read the next row, or `None` at end of stream.
    ///
    /// # Errors
    ///
    /// [`CsvError::UnterminatedEnclosure`] if the stream ends inside an
    /// enclosed field; no partial row is returned.
    pub fn next_row(&mut self) -> Result<Option<Row>> {
        self.buf.clear();
        self.ends.clear();

        let mut state = FieldState::Start;
        let mut opened_on = self.src.line();

        loop {
            let Some(byte) = self.src.next_byte()? else {
                return match state {
                    FieldState::Enclosed => {
                        Err(CsvError::UnterminatedEnclosure { line: opened_on })
                    }
                    _ if self.is_blank(state) => Ok(None),
                    _ => {
                        let line = self.src.line();
                        self.finish_row(line).map(Some)
                    }
                };
            };

            match state {
                FieldState::Enclosed => {
                    if Some(byte) == self.escape {
                        match self.src.next_byte()? {
                            Some(escaped) => self.buf.push(escaped),
                            None => return Err(CsvError::UnterminatedEnclosure { line: opened_on }),
                        }
                    } else if byte == self.enclosure {
                        if self.src.next_if(self.enclosure)? {
                            self.buf.push(self.enclosure);
                        } else {
                            state = FieldState::Unenclosed;
                        }
                    } else {
                        self.buf.push(byte);
                    }
                }
                FieldState::Start | FieldState::Unenclosed => {
                    if byte == self.delimiter {
                        self.ends.push(self.buf.len());
                        state = FieldState::Start;
                    } else if byte == b'\n' || (byte == b'\r' && self.src.next_if(b'\n')?) {
                        // The terminator's `\n` has already advanced the line count
                        let line = self.src.line() - 1;
                        if self.is_blank(state) {
                            trace!("skipping blank line {line}");
                            continue;
                        }
                        return self.finish_row(line).map(Some);
                    } else if byte == self.enclosure && state == FieldState::Start {
                        state = FieldState::Enclosed;
                        opened_on = self.src.line();
                    } else {
                        // Mid-field enclosures are literal
                        self.buf.push(byte);
                        state = FieldState::Unenclosed;
                    }
                }
            }
        }
    }

    #[inline]
    fn is_blank(&self, state: FieldState) -> bool {
        state == FieldState::Start && self.ends.is_empty() && self.buf.is_empty()
    }

    fn finish_row(&mut self, line: u64) -> Result<Row> {
        self.ends.push(self.buf.len());

        let text =
            simdutf8::basic::from_utf8(&self.buf).map_err(|_| CsvError::InvalidUtf8 { line })?;

        let mut row = Vec::with_capacity(self.ends.len());
        let mut start = 0;
        for &end in &self.ends {
            // A field boundary can still split a character the row as a whole completes
            let field = text
                .get(start..end)
                .ok_or(CsvError::InvalidUtf8 { line })?;
            row.push(field.to_owned());
            start = end;
        }

        self.rows_read += 1;
        Ok(row)
    }
}
