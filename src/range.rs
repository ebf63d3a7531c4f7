//! Parsing of single `Range: bytes=...` request headers.

use std::fmt;

use thiserror::Error;

const BYTES_UNIT: &str = "bytes=";

/// An inclusive byte interval within an object, `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    pub end: u64,
}

impl ByteRange {
    pub fn new(start: u64, end: u64) -> Self {
        ByteRange { start, end }
    }

    /// Number of bytes covered, both ends included.
    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }

    /// Half-open form, `start..end + 1`.
    pub fn to_exclusive(&self) -> std::ops::Range<u64> {
        self.start..self.end + 1
    }
}

impl fmt::Display for ByteRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RangeError {
    /// The header is not a single `bytes=<start>-<end>` range.
    #[error("malformed range header")]
    Malformed,
    /// The range is well formed but falls outside the object.
    #[error("range not satisfiable")]
    Unsatisfiable,
}

/// Parses a raw `Range` header value against an object of `size` bytes.
///
/// Returns `Ok(None)` when no header was sent. An explicit end at or past
/// `size` is rejected, not clamped; only `bytes=A-` has a computed bound.
/// `bytes=-N` is taken as `bytes=0-N`.
pub fn parse_range(header: Option<&str>, size: u64) -> Result<Option<ByteRange>, RangeError> {
    let Some(header) = header else {
        return Ok(None);
    };

    let ranges = header
        .trim()
        .strip_prefix(BYTES_UNIT)
        .ok_or(RangeError::Malformed)?;

    let (start, end) = ranges.split_once('-').ok_or(RangeError::Malformed)?;
    let start = start.trim();
    let end = end.trim();

    let range = match (start.is_empty(), end.is_empty()) {
        (true, true) => return Err(RangeError::Malformed),
        // bytes=-N reads as an omitted start, i.e. 0-N
        (true, false) => {
            let end = parse_position(end)?;
            if end >= size {
                return Err(RangeError::Unsatisfiable);
            }
            ByteRange::new(0, end)
        }
        // bytes=A-
        (false, true) => {
            let start = parse_position(start)?;
            if start >= size {
                return Err(RangeError::Unsatisfiable);
            }
            ByteRange::new(start, size - 1)
        }
        (false, false) => {
            let start = parse_position(start)?;
            let end = parse_position(end)?;
            if start > end || start >= size || end >= size {
                return Err(RangeError::Unsatisfiable);
            }
            ByteRange::new(start, end)
        }
    };

    Ok(Some(range))
}

// u64::from_str accepts a leading '+', which is not valid in a byte position.
fn parse_position(s: &str) -> Result<u64, RangeError> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(RangeError::Malformed);
    }
    s.parse().map_err(|_| RangeError::Malformed)
}
