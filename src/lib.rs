//! csv-frame: RFC4180 CSV reading and writing with line-ending checks
//!
//! Reads delimited text into rows of string fields and writes rows back
//! as RFC4180 text. Quoting, embedded delimiters and embedded line breaks
//! survive a write/read round trip. The line break ending the first row can
//! be detected, and lone-CR files rejected, before trusting a file.
//!
//! # Quick Start
//!
//! ```
//! use csv_frame::{Dialect, Reader, Statement, Writer};
//!
//! let data = "id,note\n1,\"multi\nline\"\n2,\"say \"\"hi\"\"\"\n";
//! let mut reader = Reader::from_bytes(data, Dialect::default());
//!
//! assert_eq!(reader.validate_line_break().unwrap().as_text(), "\\n");
//! assert_eq!(reader.header().unwrap(), vec!["id", "note"]);
//!
//! let body: Vec<_> = Statement::new()
//!     .offset(1)
//!     .process(&mut reader)
//!     .unwrap()
//!     .collect::<Result<_, _>>()
//!     .unwrap();
//! assert_eq!(body[1], vec!["2", "say \"hi\""]);
//!
//! let mut writer = Writer::new(Vec::new(), Dialect::default());
//! writer.write_rows(&body).unwrap();
//! assert_eq!(
//!     writer.into_inner().unwrap(),
//!     b"1,\"multi\nline\"\n2,\"say \"\"hi\"\"\"\n"
//! );
//! ```
//!
//! # Files
//!
//! [`CsvFile`] wraps a path and a dialect. Building one never touches the
//! filesystem; opening happens on first use and reports
//! [`CsvError::Unavailable`] when the file is missing.
//!
//! ```no_run
//! use csv_frame::CsvFile;
//!
//! let file = CsvFile::new("accounts.csv");
//! file.validate_line_break().unwrap();
//! for record in file.open().unwrap().records().unwrap() {
//!     let record = record.unwrap();
//!     println!("{:?}", record.get("id"));
//! }
//! ```

mod dialect;
pub mod encoding;
mod error;
mod file;
#[cfg(feature = "http")]
pub mod http;
mod line_break;
pub mod parse;
mod reader;
mod statement;
mod writer;

pub use dialect::{Dialect, DialectBuilder, EnclosePolicy};
pub use error::{CsvError, Result};
pub use file::CsvFile;
pub use line_break::{LineBreak, LineBreakCensus, detect_line_break};
pub use reader::{HeaderIndex, Reader, Record, Records, Row, Rows};
pub use statement::{Filtered, Statement};
pub use writer::Writer;
