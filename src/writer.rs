//! RFC4180 serialization of rows.

use std::io::Write;

use log::debug;

use crate::dialect::{Dialect, EnclosePolicy};
use crate::error::Result;

/// CSV writer over any `Write` sink.
///
/// A field is enclosed only when it contains the delimiter, the enclosure,
/// the escape byte or a line break (unless the dialect says
/// [`EnclosePolicy::Always`]). Enclosures inside a field are doubled, or
/// escaped when the dialect has an escape byte. Every row, the last one
/// included, ends with the dialect's newline.
///
/// # Example
///
/// ```
/// use csv_frame::{Dialect, Writer};
///
/// let mut writer = Writer::new(Vec::new(), Dialect::default());
/// writer.write_row(["plain", "with, comma", "say \"hi\""]).unwrap();
/// let out = writer.into_inner().unwrap();
/// assert_eq!(out, b"plain,\"with, comma\",\"say \"\"hi\"\"\"\n");
/// ```
#[derive(Debug)]
pub struct Writer<W: Write> {
    sink: W,
    dialect: Dialect,
    /// Encoded bytes of the row being written.
    buf: Vec<u8>,
    rows_written: u64,
}

impl<W: Write> Writer<W> {
    /// Create a writer. Nothing is written until the first row.
    pub fn new(sink: W, dialect: Dialect) -> Self {
        Self {
            sink,
            dialect,
            buf: Vec::with_capacity(256),
            rows_written: 0,
        }
    }

    /// The dialect used for serialization.
    pub fn dialect(&self) -> &Dialect {
        &self.dialect
    }

    /// Number of rows written so far.
    pub fn rows_written(&self) -> u64 {
        self.rows_written
    }

    /// Write one row followed by the newline.
    ///
    /// A row holding a single empty field is written as an empty enclosure
    /// so it is not read back as a blank line. A first field that starts
    /// with U+FEFF on the very first row is always enclosed, otherwise
    /// readers would take the character for a byte order mark and drop it.
    ///
    /// # Empty rows
    ///
    /// A row with no fields writes just the newline. Readers skip blank
    /// lines, so such a row does not come back: it is the one row shape
    /// that does not survive a write/read round trip. Write `[""]` to keep
    /// a row with a single empty field.
    pub fn write_row<I, F>(&mut self, row: I) -> Result<()>
    where
        I: IntoIterator<Item = F>,
        F: AsRef<str>,
    {
        self.buf.clear();

        let at_stream_start = self.rows_written == 0;
        let mut count = 0usize;
        let mut lone_empty = false;
        for field in row {
            let field = field.as_ref();
            if count > 0 {
                self.buf.push(self.dialect.delimiter());
            }
            let looks_like_bom = at_stream_start && count == 0 && field.starts_with('\u{FEFF}');
            self.encode_field(field, looks_like_bom);
            lone_empty = count == 0 && field.is_empty();
            count += 1;
        }

        if count == 1 && lone_empty && self.dialect.enclose_policy() == EnclosePolicy::Necessary {
            let enclosure = self.dialect.enclosure();
            self.buf.extend_from_slice(&[enclosure, enclosure]);
        }
        self.buf.extend_from_slice(self.dialect.newline().as_bytes());

        self.sink.write_all(&self.buf)?;
        self.rows_written += 1;
        Ok(())
    }

    /// Write every row in order.
    pub fn write_rows<R, I, F>(&mut self, rows: R) -> Result<()>
    where
        R: IntoIterator<Item = I>,
        I: IntoIterator<Item = F>,
        F: AsRef<str>,
    {
        for row in rows {
            self.write_row(row)?;
        }
        Ok(())
    }

    /// Flush the sink.
    pub fn flush(&mut self) -> Result<()> {
        self.sink.flush()?;
        debug!("flushed after {} rows", self.rows_written);
        Ok(())
    }

    /// Borrow the sink.
    pub fn get_ref(&self) -> &W {
        &self.sink
    }

    /// Flush and unwrap the sink.
    pub fn into_inner(mut self) -> Result<W> {
        self.flush()?;
        Ok(self.sink)
    }

    fn needs_enclosure(&self, field: &str) -> bool {
        if self.dialect.enclose_policy() == EnclosePolicy::Always {
            return true;
        }
        let delimiter = self.dialect.delimiter();
        let enclosure = self.dialect.enclosure();
        let escape = self.dialect.escape();
        field.bytes().any(|b| {
            b == delimiter || b == enclosure || b == b'\n' || b == b'\r' || Some(b) == escape
        })
    }

    fn encode_field(&mut self, field: &str, force: bool) {
        if !force && !self.needs_enclosure(field) {
            self.buf.extend_from_slice(field.as_bytes());
            return;
        }

        let enclosure = self.dialect.enclosure();
        let escape = self.dialect.escape();

        self.buf.push(enclosure);
        for b in field.bytes() {
            if b == enclosure {
                self.buf.push(escape.unwrap_or(enclosure));
            } else if let Some(e) = escape.filter(|&e| e == b) {
                self.buf.push(e);
            }
            self.buf.push(b);
        }
        self.buf.push(enclosure);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::{Reader, Row};

    fn write(rows: &[Vec<&str>], dialect: &Dialect) -> String {
        let mut writer = Writer::new(Vec::new(), dialect.clone());
        writer.write_rows(rows).unwrap();
        String::from_utf8(writer.into_inner().unwrap()).unwrap()
    }

    fn read(data: &str, dialect: &Dialect) -> Vec<Row> {
        Reader::from_bytes(data, dialect.clone())
            .rows()
            .unwrap()
            .collect::<Result<_>>()
            .unwrap()
    }

    #[test]
    fn test_plain_fields_are_not_enclosed() {
        let d = Dialect::default();
        assert_eq!(write(&[vec!["a", "b c", "tab\there"]], &d), "a,b c,tab\there\n");
    }

    #[test]
    fn test_enclosure_doubling() {
        let d = Dialect::default();
        assert_eq!(
            write(&[vec!["enclosure \" in column"]], &d),
            "\"enclosure \"\" in column\"\n"
        );
    }

    #[test]
    fn test_line_breaks_are_enclosed() {
        let d = Dialect::default();
        assert_eq!(
            write(&[vec!["a\nb", "c\rd"]], &d),
            "\"a\nb\",\"c\rd\"\n"
        );
    }

    #[test]
    fn test_backslash_is_plain_without_escape() {
        let d = Dialect::default();
        assert_eq!(write(&[vec!["hello \\", "x"]], &d), "hello \\,x\n");
    }

    #[test]
    fn test_custom_newline_and_delimiter() {
        let d = Dialect::builder()
            .delimiter(b';')
            .newline("\r\n")
            .build()
            .unwrap();
        assert_eq!(write(&[vec!["a", "b;c"], vec!["d", "e,f"]], &d), "a;\"b;c\"\r\nd;e,f\r\n");
    }

    #[test]
    fn test_always_enclose() {
        let d = Dialect::builder()
            .enclose_policy(EnclosePolicy::Always)
            .build()
            .unwrap();
        assert_eq!(write(&[vec!["a", ""]], &d), "\"a\",\"\"\n");
        assert_eq!(write(&[vec![""]], &d), "\"\"\n");
    }

    #[test]
    fn test_lone_empty_field() {
        let d = Dialect::default();
        assert_eq!(write(&[vec![""]], &d), "\"\"\n");
        assert_eq!(write(&[vec!["", ""]], &d), ",\n");
        assert_eq!(write(&[vec![]], &d), "\n");
    }

    #[test]
    fn test_empty_row_is_not_read_back() {
        let d = Dialect::default();
        let text = write(&[vec!["a"], vec![], vec!["b"]], &d);
        assert_eq!(text, "a\n\nb\n");
        assert_eq!(read(&text, &d), vec![vec!["a"], vec!["b"]]);
        assert!(read(&write(&[vec![]], &d), &d).is_empty());
    }

    #[test]
    fn test_leading_feff_is_enclosed() {
        let d = Dialect::default();
        let rows = vec![vec!["\u{FEFF}id", "name"], vec!["\u{FEFF}x", "y"]];
        let text = write(&rows, &d);
        // Only the first field of the first row is at risk
        assert_eq!(text, "\"\u{FEFF}id\",name\n\u{FEFF}x,y\n");
        assert_eq!(read(&text, &d), rows);

        let rows = vec![vec!["\u{FEFF}"]];
        assert_eq!(read(&write(&rows, &d), &d), rows);
    }

    #[test]
    fn test_escape_character() {
        let d = Dialect::builder().escape(Some(b'\\')).build().unwrap();
        assert_eq!(
            write(&[vec!["say \"hi\"", "back\\slash", "plain"]], &d),
            "\"say \\\"hi\\\"\",\"back\\\\slash\",plain\n"
        );
    }

    #[test]
    fn test_round_trip() {
        let rows = vec![
            vec!["col1", "col2"],
            vec!["enclosure \" in column", "hello \\"],
            vec!["columns with\nnew line", "columns with\ttab"],
            vec!["Columns with WINDOWS\r\nnew line", "second"],
            vec!["", ""],
            vec![""],
            vec!["\"", "\"\"", " leading space"],
        ];
        for dialect in [
            Dialect::default(),
            Dialect::tsv(),
            Dialect::builder().escape(Some(b'\\')).build().unwrap(),
            Dialect::builder()
                .enclosure(b'\'')
                .enclose_policy(EnclosePolicy::Always)
                .newline("\r\n")
                .build()
                .unwrap(),
        ] {
            let text = write(&rows, &dialect);
            assert_eq!(read(&text, &dialect), rows, "dialect {dialect}");
        }
    }

    #[test]
    fn test_rows_written() {
        let mut writer = Writer::new(Vec::new(), Dialect::default());
        writer.write_row(["a"]).unwrap();
        writer.write_row(vec!["b".to_string()]).unwrap();
        assert_eq!(writer.rows_written(), 2);
        assert_eq!(writer.get_ref(), b"a\nb\n");
    }
}
