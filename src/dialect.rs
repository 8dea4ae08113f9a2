//! Framing configuration shared by readers and writers.

use std::fmt;

use crate::error::{CsvError, Result};

/// When the writer wraps fields in the enclosure character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EnclosePolicy {
    /// Only fields containing the delimiter, the enclosure, the escape byte
    /// or a line break.
    #[default]
    Necessary,
    /// Every field.
    Always,
}

/// CSV dialect: delimiter, enclosure, escape and output newline.
///
/// A `Dialect` is immutable once built. Use [`Dialect::builder`] to
/// customize it; [`Dialect::default`] is RFC4180 with `\n` line endings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dialect {
    delimiter: u8,
    enclosure: u8,
    escape: Option<u8>,
    newline: String,
    enclose_policy: EnclosePolicy,
}

impl Default for Dialect {
    fn default() -> Self {
        Self {
            delimiter: b',',
            enclosure: b'"',
            escape: None,
            newline: "\n".to_string(),
            enclose_policy: EnclosePolicy::Necessary,
        }
    }
}

impl Dialect {
    /// Start building a dialect from the defaults.
    pub fn builder() -> DialectBuilder {
        DialectBuilder::new()
    }

    /// Tab-separated dialect, otherwise default.
    pub fn tsv() -> Self {
        Self {
            delimiter: b'\t',
            ..Self::default()
        }
    }

    /// Field delimiter byte.
    #[inline]
    pub const fn delimiter(&self) -> u8 {
        self.delimiter
    }

    /// Enclosure (quote) byte.
    #[inline]
    pub const fn enclosure(&self) -> u8 {
        self.enclosure
    }

    /// Escape byte, or `None` when enclosure doubling is the only escape.
    #[inline]
    pub const fn escape(&self) -> Option<u8> {
        self.escape
    }

    /// Row terminator used when writing.
    #[inline]
    pub fn newline(&self) -> &str {
        &self.newline
    }

    /// Enclosure policy used when writing.
    #[inline]
    pub const fn enclose_policy(&self) -> EnclosePolicy {
        self.enclose_policy
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "delimiter={:?} enclosure={:?} escape=",
            self.delimiter as char, self.enclosure as char
        )?;
        match self.escape {
            Some(e) => write!(f, "{:?}", e as char)?,
            None => write!(f, "none")?,
        }
        write!(f, " newline={:?}", self.newline)
    }
}

/// Builder for [`Dialect`].
///
/// # Example
///
/// ```
/// use csv_frame::Dialect;
///
/// let dialect = Dialect::builder()
///     .delimiter(b';')
///     .newline("\r\n")
///     .build()
///     .unwrap();
/// assert_eq!(dialect.delimiter(), b';');
/// ```
#[derive(Debug, Clone)]
pub struct DialectBuilder {
    dialect: Dialect,
}

impl Default for DialectBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl DialectBuilder {
    /// Create a builder seeded with the default dialect.
    pub fn new() -> Self {
        Self {
            dialect: Dialect::default(),
        }
    }

    /// Set the field delimiter.
    pub fn delimiter(&mut self, delimiter: u8) -> &mut Self {
        self.dialect.delimiter = delimiter;
        self
    }

    /// Set the enclosure character.
    pub fn enclosure(&mut self, enclosure: u8) -> &mut Self {
        self.dialect.enclosure = enclosure;
        self
    }

    /// Set or clear the escape character.
    pub fn escape(&mut self, escape: Option<u8>) -> &mut Self {
        self.dialect.escape = escape;
        self
    }

    /// Set the row terminator used when writing: `"\n"` or `"\r\n"`.
    pub fn newline(&mut self, newline: impl Into<String>) -> &mut Self {
        self.dialect.newline = newline.into();
        self
    }

    /// Set the enclosure policy used when writing.
    pub fn enclose_policy(&mut self, policy: EnclosePolicy) -> &mut Self {
        self.dialect.enclose_policy = policy;
        self
    }

    /// Validate and build the dialect.
    pub fn build(&self) -> Result<Dialect> {
        let d = &self.dialect;

        check_framing_byte("delimiter", d.delimiter)?;
        check_framing_byte("enclosure", d.enclosure)?;
        if let Some(escape) = d.escape {
            check_framing_byte("escape", escape)?;
            if escape == d.delimiter || escape == d.enclosure {
                return Err(CsvError::InvalidDialect(format!(
                    "escape {:?} must differ from delimiter and enclosure",
                    escape as char
                )));
            }
        }
        if d.delimiter == d.enclosure {
            return Err(CsvError::InvalidDialect(format!(
                "delimiter and enclosure are both {:?}",
                d.delimiter as char
            )));
        }
        // Readers only end rows on these two, anything else cannot be read back
        if d.newline != "\n" && d.newline != "\r\n" {
            return Err(CsvError::InvalidDialect(format!(
                "newline must be \"\\n\" or \"\\r\\n\", got {:?}",
                d.newline
            )));
        }

        Ok(d.clone())
    }
}

// Multi-byte UTF-8 sequences never contain ASCII bytes, so ASCII framing
// bytes cannot split a character.
fn check_framing_byte(name: &str, byte: u8) -> Result<()> {
    if !byte.is_ascii() {
        return Err(CsvError::InvalidDialect(format!(
            "{name} must be a single ASCII character, got byte {byte:#04x}"
        )));
    }
    if byte == b'\r' || byte == b'\n' {
        return Err(CsvError::InvalidDialect(format!(
            "{name} must not be a line break character"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_dialect() {
        let d = Dialect::default();
        assert_eq!(d.delimiter(), b',');
        assert_eq!(d.enclosure(), b'"');
        assert_eq!(d.escape(), None);
        assert_eq!(d.newline(), "\n");
        assert_eq!(d.enclose_policy(), EnclosePolicy::Necessary);
    }

    #[test]
    fn test_builder_chaining() {
        let d = Dialect::builder()
            .delimiter(b'\t')
            .enclosure(b'\'')
            .escape(Some(b'\\'))
            .newline("\r\n")
            .enclose_policy(EnclosePolicy::Always)
            .build()
            .unwrap();

        assert_eq!(d.delimiter(), b'\t');
        assert_eq!(d.enclosure(), b'\'');
        assert_eq!(d.escape(), Some(b'\\'));
        assert_eq!(d.newline(), "\r\n");
        assert_eq!(d.enclose_policy(), EnclosePolicy::Always);
    }

    #[test]
    fn test_tsv() {
        assert_eq!(Dialect::tsv().delimiter(), b'\t');
        assert_eq!(Dialect::tsv().enclosure(), b'"');
    }

    #[test]
    fn test_rejects_conflicting_bytes() {
        assert!(Dialect::builder().delimiter(b'"').build().is_err());
        assert!(Dialect::builder().escape(Some(b'"')).build().is_err());
        assert!(Dialect::builder().escape(Some(b',')).build().is_err());
    }

    #[test]
    fn test_rejects_line_breaks_and_non_ascii() {
        assert!(Dialect::builder().delimiter(b'\n').build().is_err());
        assert!(Dialect::builder().enclosure(b'\r').build().is_err());
        assert!(Dialect::builder().delimiter(0xa7).build().is_err());
        assert!(Dialect::builder().newline("").build().is_err());
    }

    #[test]
    fn test_newline_must_be_readable() {
        assert!(matches!(
            Dialect::builder().newline("\r").build(),
            Err(CsvError::InvalidDialect(_))
        ));
        assert!(Dialect::builder().newline(";").build().is_err());
        assert!(Dialect::builder().newline("\n\n").build().is_err());
        assert!(Dialect::builder().newline("\n").build().is_ok());
        assert!(Dialect::builder().newline("\r\n").build().is_ok());
    }

    #[test]
    fn test_display() {
        assert_eq!(
            Dialect::default().to_string(),
            r#"delimiter=',' enclosure='"' escape=none newline="\n""#
        );
    }
}
