//! Pull-based byte scanner over a buffered reader.

use std::collections::VecDeque;
use std::io::{self, BufRead};

use crate::encoding::UTF8_BOM;

/// Byte scanner with one byte of lookahead and physical line tracking.
#[derive(Debug)]
pub struct ByteSource<R> {
    inner: R,
    /// Bytes taken from `inner` but not yet handed out. Served first.
    pending: VecDeque<u8>,
    /// 1-based physical line of the next byte.
    line: u64,
}

impl<R: BufRead> ByteSource<R> {
    /// Wrap a buffered reader.
    pub const fn new(inner: R) -> Self {
        Self {
            inner,
            pending: VecDeque::new(),
            line: 1,
        }
    }

    /// Current 1-based physical line.
    #[inline]
    pub const fn line(&self) -> u64 {
        self.line
    }

    /// Consume and return the next byte, or `None` at end of stream.
    #[inline]
    pub fn next_byte(&mut self) -> io::Result<Option<u8>> {
        let byte = match self.pending.pop_front() {
            Some(b) => b,
            None => {
                let b = match self.fill()?.first() {
                    Some(&b) => b,
                    None => return Ok(None),
                };
                self.inner.consume(1);
                b
            }
        };
        if byte == b'\n' {
            self.line += 1;
        }
        Ok(Some(byte))
    }

    /// Return the next byte without consuming it.
    #[inline]
    pub fn peek_byte(&mut self) -> io::Result<Option<u8>> {
        if let Some(&b) = self.pending.front() {
            return Ok(Some(b));
        }
        Ok(self.fill()?.first().copied())
    }

    /// Consume the next byte if it equals `expected`.
    #[inline]
    pub fn next_if(&mut self, expected: u8) -> io::Result<bool> {
        if self.peek_byte()? == Some(expected) {
            self.next_byte()?;
            return Ok(true);
        }
        Ok(false)
    }

    /// Skip a UTF-8 byte order mark at the current position.
    ///
    /// Returns true if one was skipped. The mark may arrive split across
    /// several reads; on a partial match the bytes already taken are
    /// handed out again by [`next_byte`](Self::next_byte).
    pub fn skip_bom(&mut self) -> io::Result<bool> {
        if !self.pending.is_empty() {
            return Ok(false);
        }
        for &expected in UTF8_BOM {
            if self.fill()?.first() != Some(&expected) {
                return Ok(false);
            }
            self.inner.consume(1);
            self.pending.push_back(expected);
        }
        self.pending.clear();
        Ok(true)
    }

    #[inline]
    fn fill(&mut self) -> io::Result<&[u8]> {
        self.inner.fill_buf()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufReader, Read};

    /// Hands out at most one byte per `read` call.
    struct OneByteReads<'a>(&'a [u8]);

    impl Read for OneByteReads<'_> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let n = self.0.len().min(buf.len()).min(1);
            buf[..n].copy_from_slice(&self.0[..n]);
            self.0 = &self.0[n..];
            Ok(n)
        }
    }

    fn drain<R: BufRead>(src: &mut ByteSource<R>) -> Vec<u8> {
        let mut out = Vec::new();
        while let Some(b) = src.next_byte().unwrap() {
            out.push(b);
        }
        out
    }

    #[test]
    fn test_next_and_peek() {
        let mut src = ByteSource::new(&b"ab"[..]);
        assert_eq!(src.peek_byte().unwrap(), Some(b'a'));
        assert_eq!(src.next_byte().unwrap(), Some(b'a'));
        assert!(src.next_if(b'b').unwrap());
        assert_eq!(src.next_byte().unwrap(), None);
        assert_eq!(src.peek_byte().unwrap(), None);
    }

    #[test]
    fn test_line_tracking() {
        let mut src = ByteSource::new(&b"a\r\nb\rc\n"[..]);
        while src.next_byte().unwrap().is_some() {}
        // Lone CR does not advance the line count
        assert_eq!(src.line(), 3);
    }

    #[test]
    fn test_skip_bom() {
        let mut src = ByteSource::new(&b"\xEF\xBB\xBFa"[..]);
        assert!(src.skip_bom().unwrap());
        assert_eq!(src.next_byte().unwrap(), Some(b'a'));

        let mut src = ByteSource::new(&b"a"[..]);
        assert!(!src.skip_bom().unwrap());
        assert_eq!(src.next_byte().unwrap(), Some(b'a'));
    }

    #[test]
    fn test_skip_bom_split_across_reads() {
        let mut src = ByteSource::new(BufReader::new(OneByteReads(b"\xEF\xBB\xBFid\n")));
        assert!(src.skip_bom().unwrap());
        assert_eq!(drain(&mut src), b"id\n");
    }

    #[test]
    fn test_partial_bom_is_not_lost() {
        let mut src = ByteSource::new(BufReader::new(OneByteReads(b"\xEF\xBBx\n")));
        assert!(!src.skip_bom().unwrap());
        assert_eq!(src.peek_byte().unwrap(), Some(0xEF));
        assert!(!src.skip_bom().unwrap());
        assert_eq!(drain(&mut src), b"\xEF\xBBx\n");
        assert_eq!(src.line(), 2);
    }
}
