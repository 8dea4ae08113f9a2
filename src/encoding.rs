//! Byte order marks, UTF-8 validation and legacy-encoding transcoding.
//!
//! Fields are always strings, so every row must be UTF-8 once decoded.
//! Input in a legacy encoding can be transcoded up front with
//! [`transcode_to_utf8`]; `chardetng` guesses the source encoding and
//! `encoding_rs` performs the conversion.

use std::borrow::Cow;

use chardetng::EncodingDetector;
use encoding_rs::{Encoding, UTF_8, UTF_16BE, UTF_16LE};
use simdutf8::basic::from_utf8;

/// The UTF-8 byte order mark.
pub const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

const UTF16LE_BOM: &[u8] = b"\xFF\xFE";
const UTF16BE_BOM: &[u8] = b"\xFE\xFF";

/// Check if the given bytes are valid UTF-8.
pub fn is_utf8(data: &[u8]) -> bool {
    from_utf8(data).is_ok()
}

/// Check if the data starts with a UTF-8 BOM.
pub fn has_utf8_bom(data: &[u8]) -> bool {
    data.starts_with(UTF8_BOM)
}

/// Strip a leading UTF-8 BOM, if any.
pub fn skip_bom(data: &[u8]) -> &[u8] {
    data.strip_prefix(UTF8_BOM).unwrap_or(data)
}

/// Encoding facts about a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodingInfo {
    /// The buffer, minus any BOM, is valid UTF-8.
    pub is_utf8: bool,
    /// The buffer starts with a UTF-8 BOM.
    pub has_bom: bool,
    /// Best guess of the source encoding.
    pub encoding: &'static Encoding,
}

impl EncodingInfo {
    /// WHATWG label of the guessed encoding, e.g. `"UTF-8"` or `"windows-1251"`.
    pub fn name(&self) -> &'static str {
        self.encoding.name()
    }
}

/// Inspect the encoding of a buffer without converting it.
pub fn detect_encoding(data: &[u8]) -> EncodingInfo {
    let has_bom = has_utf8_bom(data);
    let is_utf8 = is_utf8(skip_bom(data));
    EncodingInfo {
        is_utf8,
        has_bom,
        encoding: guess_encoding(data, is_utf8),
    }
}

fn guess_encoding(data: &[u8], is_utf8: bool) -> &'static Encoding {
    if data.starts_with(UTF16LE_BOM) {
        return UTF_16LE;
    }
    if data.starts_with(UTF16BE_BOM) {
        return UTF_16BE;
    }
    if is_utf8 {
        return UTF_8;
    }
    let mut detector = EncodingDetector::new();
    detector.feed(data, true);
    detector.guess(None, true)
}

/// Convert `data` to UTF-8, guessing its encoding.
///
/// Valid UTF-8 input is returned borrowed and untouched (BOM included).
/// UTF-16 input is recognized by its BOM; anything else that is not UTF-8
/// goes through `chardetng`. Returns the converted bytes and the encoding
/// they were decoded from.
pub fn transcode_to_utf8(data: &[u8]) -> (Cow<'_, [u8]>, &'static Encoding) {
    let encoding = guess_encoding(data, is_utf8(skip_bom(data)));
    if encoding == UTF_8 {
        return (Cow::Borrowed(data), UTF_8);
    }

    // decode() strips a BOM matching the encoding
    let (decoded, actual, _had_errors) = encoding.decode(data);
    (Cow::Owned(decoded.into_owned().into_bytes()), actual)
}
