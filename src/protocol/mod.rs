//! LIP Protocol Implementation
//!
//! This module provides the wire-level pieces of the Lutron Integration
//! Protocol: outbound command serialization and inbound "read until"
//! matching for prompts and response lines.
//!
//! ## Modules
//!
//! - `types`: Protocol constants, vocabulary enums, `Command` and `Response`
//! - `parser`: Literal/pattern matcher and response decoding
//!
//! ## Example
//!
//! ```
//! use lipbridge::protocol::{parse_response, Action, Command, OUTPUT};
//! use bytes::BytesMut;
//!
//! // Building commands
//! let bytes = Command::execute(OUTPUT, 2, Action::Set).with_value(75.0).serialize();
//! assert_eq!(bytes, b"#OUTPUT,2,1,75\r\n");
//!
//! // Parsing incoming data
//! let mut buf = BytesMut::from(&b"~OUTPUT,2,1,100.00\r\n"[..]);
//! let response = parse_response(&mut buf).unwrap().unwrap();
//! assert_eq!(response.value, 100.0);
//! ```

pub mod parser;
pub mod types;

// Re-export commonly used types for convenience
pub use parser::{
    decode_response, parse_response, Match, Matcher, ParseError, ParseResult, RESPONSE_PATTERN,
};
pub use types::{Action, Button, Command, Response, DEVICE, OUTPUT};
