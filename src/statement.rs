//! Offset and limit selection over a row sequence.

use std::io::{Read, Seek};
use std::iter::FusedIterator;

use crate::error::Result;
use crate::reader::{Reader, Row, Rows};

/// Query selecting a window of rows.
///
/// The offset counts raw rows, header included. Offsets past the end give
/// an empty sequence.
///
/// ```
/// use csv_frame::{Dialect, Reader, Statement};
///
/// let mut reader = Reader::from_bytes("id,isImported\n15,0\n18,0\n", Dialect::default());
/// let rows: Vec<_> = Statement::new()
///     .offset(1)
///     .process(&mut reader)
///     .unwrap()
///     .collect::<Result<_, _>>()
///     .unwrap();
/// assert_eq!(rows, vec![vec!["15", "0"], vec!["18", "0"]]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Statement {
    offset: usize,
    limit: Option<usize>,
}

impl Statement {
    /// A statement selecting every row.
    pub const fn new() -> Self {
        Self {
            offset: 0,
            limit: None,
        }
    }

    /// Skip the first `offset` rows.
    #[must_use]
    pub const fn offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    /// Yield at most `limit` rows after the offset.
    #[must_use]
    pub const fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Rows to skip.
    pub const fn get_offset(&self) -> usize {
        self.offset
    }

    /// Maximum rows to yield, if capped.
    pub const fn get_limit(&self) -> Option<usize> {
        self.limit
    }

    /// Apply the statement to a fresh scan of `reader`.
    pub fn process<'r, S: Read + Seek>(
        &self,
        reader: &'r mut Reader<S>,
    ) -> Result<Filtered<Rows<'r, S>>> {
        Ok(self.apply(reader.rows()?))
    }

    /// Apply the statement to any fallible row iterator.
    pub fn apply<I>(&self, rows: I) -> Filtered<I>
    where
        I: Iterator<Item = Result<Row>>,
    {
        Filtered {
            rows,
            to_skip: self.offset,
            remaining: self.limit,
            failed: false,
        }
    }
}

/// Rows selected by a [`Statement`].
///
/// Skipped rows are still parsed; an error among them is yielded and ends
/// the sequence.
#[derive(Debug)]
pub struct Filtered<I> {
    rows: I,
    to_skip: usize,
    remaining: Option<usize>,
    failed: bool,
}

impl<I> Iterator for Filtered<I>
where
    I: Iterator<Item = Result<Row>>,
{
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.remaining == Some(0) {
            return None;
        }

        while self.to_skip > 0 {
            self.to_skip -= 1;
            if let Err(e) = self.rows.next()? {
                self.failed = true;
                return Some(Err(e));
            }
        }

        let item = self.rows.next()?;
        match &item {
            Ok(_) => {
                if let Some(remaining) = self.remaining.as_mut() {
                    *remaining -= 1;
                }
            }
            Err(_) => self.failed = true,
        }
        Some(item)
    }
}

impl<I> FusedIterator for Filtered<I> where I: FusedIterator<Item = Result<Row>> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::Dialect;
    use crate::error::CsvError;

    const SIMPLE: &str = "id,isImported\n15,0\n18,0\n19,0\n";

    fn select(statement: Statement, data: &str) -> Vec<Row> {
        let mut reader = Reader::from_bytes(data, Dialect::default());
        statement
            .process(&mut reader)
            .unwrap()
            .collect::<Result<_>>()
            .unwrap()
    }

    #[test]
    fn test_no_offset_is_identity() {
        assert_eq!(
            select(Statement::new(), SIMPLE),
            vec![
                vec!["id", "isImported"],
                vec!["15", "0"],
                vec!["18", "0"],
                vec!["19", "0"]
            ]
        );
    }

    #[test]
    fn test_offset_skips_header() {
        assert_eq!(
            select(Statement::new().offset(1), SIMPLE),
            vec![vec!["15", "0"], vec!["18", "0"], vec!["19", "0"]]
        );
    }

    #[test]
    fn test_offset_multiple() {
        assert_eq!(select(Statement::new().offset(3), SIMPLE), vec![vec!["19", "0"]]);
    }

    #[test]
    fn test_offset_overflow() {
        assert!(select(Statement::new().offset(4), SIMPLE).is_empty());
        assert!(select(Statement::new().offset(100), SIMPLE).is_empty());
    }

    #[test]
    fn test_limit() {
        assert_eq!(
            select(Statement::new().offset(1).limit(2), SIMPLE),
            vec![vec!["15", "0"], vec!["18", "0"]]
        );
        assert!(select(Statement::new().limit(0), SIMPLE).is_empty());
    }

    #[test]
    fn test_offsets_are_suffixes() {
        let all = select(Statement::new(), SIMPLE);
        for n in 0..=all.len() + 1 {
            let tail = select(Statement::new().offset(n), SIMPLE);
            assert_eq!(tail[..], all[n.min(all.len())..]);
        }
    }

    #[test]
    fn test_error_in_skipped_rows_is_reported() {
        let rows = vec![
            Ok(vec!["a".to_string()]),
            Err(CsvError::UnterminatedEnclosure { line: 2 }),
            Ok(vec!["c".to_string()]),
        ];
        let mut filtered = Statement::new().offset(2).apply(rows.into_iter());
        assert!(matches!(filtered.next(), Some(Err(_))));
        assert!(filtered.next().is_none());
    }

    #[test]
    fn test_accessors() {
        let stmt = Statement::new().offset(5).limit(10);
        assert_eq!(stmt.get_offset(), 5);
        assert_eq!(stmt.get_limit(), Some(10));
    }
}
