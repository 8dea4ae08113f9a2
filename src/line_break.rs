//! Line-break detection and validation.
//!
//! Only the terminator that ends the first row is inspected. Line breaks
//! inside an enclosed field of that row are content and are skipped.

use std::fmt;
use std::io::BufRead;

use log::{debug, warn};

use crate::dialect::Dialect;
use crate::error::{CsvError, Result};
use crate::parse::source::ByteSource;

/// Row terminator conventions.
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LineBreak {
    /// Unix-style line ending (\n).
    #[default]
    LF,
    /// Windows-style line ending (\r\n).
    CRLF,
    /// Old Mac-style line ending (\r).
    CR,
}

impl LineBreak {
    /// Returns the byte sequence for this line break.
    pub const fn as_bytes(&self) -> &'static [u8] {
        match self {
            LineBreak::LF => b"\n",
            LineBreak::CRLF => b"\r\n",
            LineBreak::CR => b"\r",
        }
    }

    /// Returns the line break itself.
    pub const fn as_str(&self) -> &'static str {
        match self {
            LineBreak::LF => "\n",
            LineBreak::CRLF => "\r\n",
            LineBreak::CR => "\r",
        }
    }

    /// Returns the escaped textual rendering, e.g. `\r\n`.
    pub const fn as_text(&self) -> &'static str {
        match self {
            LineBreak::LF => "\\n",
            LineBreak::CRLF => "\\r\\n",
            LineBreak::CR => "\\r",
        }
    }

    /// Accept LF and CRLF, reject lone CR.
    ///
    /// Lone CR endings cannot be told apart from carriage returns inside
    /// unenclosed fields, so they are refused rather than guessed.
    pub fn validate(self) -> Result<Self> {
        match self {
            LineBreak::LF | LineBreak::CRLF => Ok(self),
            LineBreak::CR => {
                warn!("rejecting {} line endings", self.as_text());
                Err(CsvError::InvalidLineBreak(self))
            }
        }
    }
}

impl fmt::Display for LineBreak {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_text())
    }
}

/// Detect the line break ending the first row of `data`.
///
/// Blank lines before the first row are skipped, as the reader does.
/// Defaults to [`LineBreak::LF`] when the first row is not terminated.
///
/// ```
/// use csv_frame::{detect_line_break, Dialect, LineBreak};
///
/// let d = Dialect::default();
/// assert_eq!(detect_line_break(b"a,b\r\n1,2\r\n", &d), LineBreak::CRLF);
/// assert_eq!(detect_line_break(b"\"x\ny\",b\r1,2", &d), LineBreak::CR);
/// assert_eq!(detect_line_break(b"a,b", &d), LineBreak::LF);
/// assert_eq!(detect_line_break(b"\r\na,b\n1,2\n", &d), LineBreak::LF);
/// ```
pub fn detect_line_break(data: &[u8], dialect: &Dialect) -> LineBreak {
    // Reading from a slice cannot fail
    scan_first_terminator(&mut ByteSource::new(data), dialect).unwrap_or_default()
}

/// Detect the line break ending the first row read from `src`.
pub(crate) fn detect_from_source<R: BufRead>(
    src: &mut ByteSource<R>,
    dialect: &Dialect,
) -> Result<LineBreak> {
    let line_break = scan_first_terminator(src, dialect)?;
    debug!("detected {} line endings", line_break.as_text());
    Ok(line_break)
}

fn scan_first_terminator<R: BufRead>(
    src: &mut ByteSource<R>,
    dialect: &Dialect,
) -> Result<LineBreak> {
    src.skip_bom()?;

    let mut at_field_start = true;
    let mut enclosed = false;
    let mut row_started = false;

    while let Some(byte) = src.next_byte()? {
        if enclosed {
            if Some(byte) == dialect.escape() {
                src.next_byte()?;
            } else if byte == dialect.enclosure() && !src.next_if(dialect.enclosure())? {
                enclosed = false;
            }
            continue;
        }

        match byte {
            // Blank line, the tokenizer never yields it as a row
            b'\n' if !row_started => continue,
            b'\r' if !row_started && src.next_if(b'\n')? => continue,
            b'\n' => return Ok(LineBreak::LF),
            b'\r' if src.next_if(b'\n')? => return Ok(LineBreak::CRLF),
            b'\r' => return Ok(LineBreak::CR),
            _ => {}
        }

        row_started = true;
        match byte {
            b if b == dialect.delimiter() => at_field_start = true,
            b if b == dialect.enclosure() && at_field_start => enclosed = true,
            _ => at_field_start = false,
        }
    }

    Ok(LineBreak::default())
}

/// Occurrence counts of every line-break convention in a buffer.
///
/// Counts are raw: breaks inside enclosed fields are included. Useful to
/// spot files with mixed endings; not a validation gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LineBreakCensus {
    /// `\n` not preceded by `\r`.
    pub lf: usize,
    /// `\r\n` pairs.
    pub crlf: usize,
    /// `\r` not followed by `\n`.
    pub cr: usize,
}

impl LineBreakCensus {
    /// Count line breaks in `data`.
    pub fn from_bytes(data: &[u8]) -> Self {
        let newlines = bytecount::count(data, b'\n');
        let returns = bytecount::count(data, b'\r');
        let crlf = data.windows(2).filter(|w| *w == b"\r\n").count();

        Self {
            lf: newlines - crlf,
            crlf,
            cr: returns - crlf,
        }
    }

    /// Total number of line breaks.
    pub const fn total(&self) -> usize {
        self.lf + self.crlf + self.cr
    }

    /// The most frequent convention, or `None` if there are no line breaks.
    ///
    /// Ties prefer CRLF, then LF.
    pub fn dominant(&self) -> Option<LineBreak> {
        if self.total() == 0 {
            return None;
        }
        if self.crlf >= self.lf && self.crlf >= self.cr {
            Some(LineBreak::CRLF)
        } else if self.lf >= self.cr {
            Some(LineBreak::LF)
        } else {
            Some(LineBreak::CR)
        }
    }

    /// True if more than one convention occurs.
    pub fn is_mixed(&self) -> bool {
        [self.lf, self.crlf, self.cr].iter().filter(|&&n| n > 0).count() > 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detect(data: &[u8]) -> LineBreak {
        detect_line_break(data, &Dialect::default())
    }

    #[test]
    fn test_detect() {
        assert_eq!(detect(b"a,b\nc,d\n"), LineBreak::LF);
        assert_eq!(detect(b"a,b\r\nc,d\r\n"), LineBreak::CRLF);
        assert_eq!(detect(b"a,b\rc,d\r"), LineBreak::CR);
    }

    #[test]
    fn test_only_first_row_counts() {
        assert_eq!(detect(b"a,b\nc,d\r\ne,f\r\n"), LineBreak::LF);
        assert_eq!(detect(b"a,b\r\nc,d\ne,f\n"), LineBreak::CRLF);
    }

    #[test]
    fn test_single_row_defaults_to_lf() {
        assert_eq!(detect(b"id,name"), LineBreak::LF);
        assert_eq!(detect(b""), LineBreak::LF);
    }

    #[test]
    fn test_leading_blank_lines_are_skipped() {
        assert_eq!(detect(b"\r\na,b\n1,2\n"), LineBreak::LF);
        assert_eq!(detect(b"\n\na,b\r\n1,2\r\n"), LineBreak::CRLF);
        assert_eq!(detect(b"\xEF\xBB\xBF\n\r\na,b\r\n"), LineBreak::CRLF);
        assert_eq!(detect(b"\n\n"), LineBreak::LF);
        // A lone CR is still reported wherever it shows up
        assert_eq!(detect(b"\ra,b\n"), LineBreak::CR);
    }

    #[test]
    fn test_trailing_cr() {
        assert_eq!(detect(b"id,name\r"), LineBreak::CR);
    }

    #[test]
    fn test_enclosed_breaks_are_ignored() {
        assert_eq!(detect(b"\"multi\nline\",b\r\nc,d\r\n"), LineBreak::CRLF);
        assert_eq!(detect(b"\"a \"\"q\"\"\r\n\",b\nc\n"), LineBreak::LF);
    }

    #[test]
    fn test_bom_is_skipped() {
        assert_eq!(detect(b"\xEF\xBB\xBFa\r\nb"), LineBreak::CRLF);
    }

    #[test]
    fn test_text_rendering() {
        assert_eq!(LineBreak::LF.as_str(), "\n");
        assert_eq!(LineBreak::CRLF.as_text(), "\\r\\n");
        assert_eq!(LineBreak::CR.to_string(), "\\r");
        assert_eq!(LineBreak::CRLF.as_bytes(), b"\r\n");
    }

    #[test]
    fn test_validate() {
        assert_eq!(LineBreak::LF.validate().unwrap(), LineBreak::LF);
        assert_eq!(LineBreak::CRLF.validate().unwrap(), LineBreak::CRLF);
        assert!(matches!(
            LineBreak::CR.validate(),
            Err(CsvError::InvalidLineBreak(LineBreak::CR))
        ));
    }

    #[test]
    fn test_census() {
        let census = LineBreakCensus::from_bytes(b"a\r\nb\nc\rd\r\n");
        assert_eq!(census, LineBreakCensus { lf: 1, crlf: 2, cr: 1 });
        assert_eq!(census.total(), 4);
        assert_eq!(census.dominant(), Some(LineBreak::CRLF));
        assert!(census.is_mixed());
    }

    #[test]
    fn test_census_uniform() {
        let census = LineBreakCensus::from_bytes(b"a\nb\n");
        assert_eq!(census.dominant(), Some(LineBreak::LF));
        assert!(!census.is_mixed());
        assert_eq!(LineBreakCensus::from_bytes(b"abc").dominant(), None);
    }
}
