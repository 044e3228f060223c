//! Incremental "read until" Matching
//!
//! The bridge speaks a line protocol, but during login it sends bare prompts
//! (`login: `, `password: `, `GNET> `) with no line terminator. Both cases
//! are served by one primitive: search the accumulated bytes for a
//! [`Matcher`], and if it is found, cut everything up to the end of the match
//! off the front of the buffer.
//!
//! ## How Matching Works
//!
//! [`Matcher::take`] inspects a `BytesMut` buffer and returns either:
//! - `Some(Match)` - The matcher was found; the buffer has been advanced past it
//! - `None` - Not found yet; the buffer is untouched and the caller must refill
//!
//! Anything in front of the match (echoed prompts, blank lines, unrelated
//! output) is consumed along with it. A partial line never matches, so a
//! response split across socket reads waits in the buffer until its CRLF
//! arrives.

use crate::protocol::types::Response;
use bytes::{Bytes, BytesMut};
use regex::bytes::Regex;
use std::ops::Range;
use std::sync::LazyLock;
use thiserror::Error;

/// Errors that can occur while decoding a matched response line.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ParseError {
    /// A capture group the pattern promises was absent
    #[error("missing field {0}")]
    MissingField(usize),

    /// Mode text was not valid ASCII/UTF-8
    #[error("invalid UTF-8: {0}")]
    InvalidUtf8(String),

    /// Integration ID or action was not a plain unsigned integer
    #[error("invalid integer: {0}")]
    InvalidInteger(String),

    /// Value was not a decimal number
    #[error("invalid number: {0}")]
    InvalidNumber(String),
}

/// Result type for decoding operations.
pub type ParseResult<T> = Result<T, ParseError>;

/// `~MODE,INT,ACTION,VALUE\r\n`
///
/// The numeric classes admit dots because the bridge formats levels as
/// `100.00`; the integer fields are checked again during decoding.
pub static RESPONSE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"~([A-Z]+),([0-9.]+),([0-9.]+),([0-9.]+)\r\n")
        .expect("response pattern is a valid regex")
});

/// What a "read until" call is waiting for.
#[derive(Debug, Clone)]
pub enum Matcher {
    /// An exact byte sequence, such as a login prompt
    Literal(Bytes),

    /// A line grammar, such as [`RESPONSE_PATTERN`]
    Pattern(&'static Regex),
}

impl Matcher {
    /// Matcher for a literal marker.
    pub fn literal(marker: impl Into<Bytes>) -> Self {
        Matcher::Literal(marker.into())
    }

    /// Matcher for a complete LIP response line.
    pub fn response() -> Self {
        Matcher::Pattern(&RESPONSE_PATTERN)
    }

    /// Locates the first match in `buf`.
    ///
    /// Returns the offset one past the end of the match together with the
    /// capture group ranges (empty for literals).
    pub fn find(&self, buf: &[u8]) -> Option<(usize, Vec<Option<Range<usize>>>)> {
        match self {
            Matcher::Literal(marker) => {
                find_subslice(buf, marker).map(|pos| (pos + marker.len(), Vec::new()))
            }
            Matcher::Pattern(regex) => {
                let captures = regex.captures(buf)?;
                let end = captures.get(0)?.end();
                let groups = captures
                    .iter()
                    .skip(1)
                    .map(|group| group.map(|m| m.range()))
                    .collect();
                Some((end, groups))
            }
        }
    }

    /// Finds a match and consumes the buffer up to its end.
    ///
    /// On `None` the buffer is left exactly as it was.
    pub fn take(&self, buf: &mut BytesMut) -> Option<Match> {
        let (end, groups) = self.find(buf)?;
        let consumed = buf.split_to(end).freeze();
        Some(Match { consumed, groups })
    }
}

/// The bytes consumed by a successful match.
#[derive(Debug, Clone, PartialEq)]
pub struct Match {
    consumed: Bytes,
    groups: Vec<Option<Range<usize>>>,
}

impl Match {
    /// Everything that was removed from the buffer, including leading junk.
    pub fn consumed(&self) -> &Bytes {
        &self.consumed
    }

    /// Capture group `index` (1-based, as in the pattern).
    pub fn group(&self, index: usize) -> Option<&[u8]> {
        let range = self.groups.get(index.checked_sub(1)?)?.clone()?;
        self.consumed.get(range)
    }
}

/// Decodes a match of [`RESPONSE_PATTERN`] into a [`Response`].
pub fn decode_response(m: &Match) -> ParseResult<Response> {
    let mode = field(m, 1)?.to_string();
    let integration = field(m, 2)?
        .parse::<u32>()
        .map_err(|e| ParseError::InvalidInteger(e.to_string()))?;
    let action = field(m, 3)?
        .parse::<u32>()
        .map_err(|e| ParseError::InvalidInteger(e.to_string()))?;
    let value_text = field(m, 4)?;
    let value = value_text
        .parse::<f64>()
        .map_err(|_| ParseError::InvalidNumber(value_text.to_string()))?;

    Ok(Response {
        mode,
        integration,
        action,
        value,
    })
}

/// Convenience: match and decode one response line from a buffer.
///
/// Returns `None` when no complete line is buffered yet.
pub fn parse_response(buf: &mut BytesMut) -> Option<ParseResult<Response>> {
    Matcher::response().take(buf).map(|m| decode_response(&m))
}

fn field(m: &Match, index: usize) -> ParseResult<&str> {
    let bytes = m.group(index).ok_or(ParseError::MissingField(index))?;
    std::str::from_utf8(bytes).map_err(|e| ParseError::InvalidUtf8(e.to_string()))
}

/// Finds the first occurrence of `needle` in `haystack`.
fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() {
        return Some(0);
    }
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_consumes_through_marker() {
        let mut buf = BytesMut::from(&b"Welcome\r\nlogin: rest"[..]);
        let m = Matcher::literal(&b"login: "[..]).take(&mut buf).unwrap();
        assert_eq!(&m.consumed()[..], b"Welcome\r\nlogin: ");
        assert_eq!(&buf[..], b"rest");
    }

    #[test]
    fn test_literal_not_found_leaves_buffer() {
        let mut buf = BytesMut::from(&b"logi"[..]);
        assert!(Matcher::literal(&b"login: "[..]).take(&mut buf).is_none());
        assert_eq!(&buf[..], b"logi");
    }

    #[test]
    fn test_empty_literal_matches_immediately() {
        let mut buf = BytesMut::from(&b"abc"[..]);
        let m = Matcher::literal(Bytes::new()).take(&mut buf).unwrap();
        assert!(m.consumed().is_empty());
        assert_eq!(&buf[..], b"abc");
    }

    #[test]
    fn test_parse_response() {
        let mut buf = BytesMut::from(&b"~OUTPUT,2,1,100.00\r\n"[..]);
        let response = parse_response(&mut buf).unwrap().unwrap();
        assert_eq!(
            response,
            Response {
                mode: "OUTPUT".to_string(),
                integration: 2,
                action: 1,
                value: 100.0,
            }
        );
        assert!(buf.is_empty());
    }

    #[test]
    fn test_parse_response_skips_prompt_noise() {
        let mut buf = BytesMut::from(&b"GNET> ~DEVICE,1,3,0\r\nGNET> "[..]);
        let response = parse_response(&mut buf).unwrap().unwrap();
        assert_eq!(response.mode, "DEVICE");
        assert_eq!(response.integration, 1);
        assert_eq!(response.action, 3);
        assert_eq!(response.value, 0.0);
        assert_eq!(&buf[..], b"GNET> ");
    }

    #[test]
    fn test_partial_line_does_not_match() {
        let mut buf = BytesMut::from(&b"~OUTPUT,2,1,100.00\r"[..]);
        assert!(parse_response(&mut buf).is_none());
        assert_eq!(buf.len(), 19);

        buf.extend_from_slice(b"\n");
        assert!(parse_response(&mut buf).unwrap().is_ok());
    }

    #[test]
    fn test_two_lines_leave_remainder() {
        let mut buf = BytesMut::from(&b"~OUTPUT,2,1,50.00\r\n~OUTPUT,3,1,0.00\r\n"[..]);
        let first = parse_response(&mut buf).unwrap().unwrap();
        assert_eq!(first.integration, 2);
        assert_eq!(&buf[..], b"~OUTPUT,3,1,0.00\r\n");
        let second = parse_response(&mut buf).unwrap().unwrap();
        assert_eq!(second.integration, 3);
        assert!(buf.is_empty());
    }

    #[test]
    fn test_dotted_integration_is_decode_error() {
        let mut buf = BytesMut::from(&b"~OUTPUT,2.5,1,50\r\n"[..]);
        let result = parse_response(&mut buf).unwrap();
        assert!(matches!(result, Err(ParseError::InvalidInteger(_))));
        // the malformed line is still consumed
        assert!(buf.is_empty());
    }

    #[test]
    fn test_malformed_value_is_decode_error() {
        let mut buf = BytesMut::from(&b"~OUTPUT,2,1,1.2.3\r\n"[..]);
        let result = parse_response(&mut buf).unwrap();
        assert!(matches!(result, Err(ParseError::InvalidNumber(_))));
    }

    #[test]
    fn test_lowercase_mode_never_matches() {
        let mut buf = BytesMut::from(&b"~output,2,1,50\r\n"[..]);
        assert!(parse_response(&mut buf).is_none());
    }

    #[test]
    fn test_group_indexing() {
        let mut buf = BytesMut::from(&b"~OUTPUT,7,1,25.50\r\n"[..]);
        let m = Matcher::response().take(&mut buf).unwrap();
        assert_eq!(m.group(1), Some(&b"OUTPUT"[..]));
        assert_eq!(m.group(4), Some(&b"25.50"[..]));
        assert_eq!(m.group(0), None);
        assert_eq!(m.group(5), None);
    }
}
