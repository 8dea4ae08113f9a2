//! Byte-level scanning of CSV streams.
//!
//! [`source::ByteSource`] pulls bytes from any `BufRead` with one byte of
//! lookahead; [`tokenizer::Tokenizer`] turns those bytes into rows.

pub mod source;
pub mod tokenizer;
