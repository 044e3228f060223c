//! LIP (Lutron Integration Protocol) Wire Types
//!
//! This module defines the messages exchanged with a Lutron bridge over its
//! Telnet-style integration port. Every message is a single ASCII line
//! terminated by CRLF.
//!
//! ## Protocol Format
//!
//! Each line starts with a type prefix byte:
//! - `#` Command (set-style operation)
//! - `?` Query (ask the bridge for current state)
//! - `~` Response (sent by the bridge, monitoring or query reply)
//!
//! ## Examples
//!
//! Command: `#OUTPUT,2,1,75\r\n`
//! Query: `?OUTPUT,2,1\r\n`
//! Response: `~OUTPUT,2,1,100.00\r\n`
//! Keepalive: `#PING\r\n`
//! Logout: `LOGOUT\r\n`

use bytes::Bytes;
use std::fmt;

/// The CRLF terminator used by every LIP line
pub const CRLF: &[u8] = b"\r\n";

/// Number of bytes requested from the socket per refill
pub const READ_SIZE: usize = 1024;

/// Marker the bridge sends when it wants the username
pub const LOGIN_PROMPT: &[u8] = b"login: ";

/// Marker the bridge sends when it wants the password
pub const PASSWORD_PROMPT: &[u8] = b"password: ";

/// Prompt the bridge prints once login has completed
pub const DEFAULT_PROMPT: &[u8] = b"GNET> ";

/// Keepalive line
pub const PING_LINE: &[u8] = b"#PING\r\n";

/// Logout line
pub const LOGOUT_LINE: &[u8] = b"LOGOUT\r\n";

/// Mode for zones (dimmers, switches, shades)
pub const OUTPUT: &str = "OUTPUT";

/// Mode for keypads, remotes and the bridge's own scene buttons
pub const DEVICE: &str = "DEVICE";

/// LIP line prefixes
pub mod prefix {
    pub const COMMAND: u8 = b'#';
    pub const QUERY: u8 = b'?';
    pub const RESPONSE: u8 = b'~';
}

/// Action codes used with the `OUTPUT` mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum Action {
    /// Get or set zone level
    Set = 1,
    /// Start raising
    Raising = 2,
    /// Start lowering
    Lowering = 3,
    /// Stop raising/lowering
    Stop = 4,
    /// Activate a preset
    Preset = 6,
}

/// Button/device action codes used with the `DEVICE` mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum Button {
    Press = 3,
    Release = 4,
    Hold = 5,
    DoubleTap = 6,
    LedState = 9,
}

impl From<Action> for u32 {
    fn from(action: Action) -> Self {
        action as u32
    }
}

impl From<Button> for u32 {
    fn from(button: Button) -> Self {
        button as u32
    }
}

/// An outbound LIP message.
///
/// Commands are built with the constructors below and turned into wire
/// bytes with [`Command::serialize`].
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// `#MODE,INT,ACTION[,VALUE][,ARG...]`
    Execute {
        mode: String,
        integration: u32,
        action: u32,
        value: Option<f64>,
        args: Vec<Option<String>>,
    },

    /// `?MODE,INT,ACTION`
    Query {
        mode: String,
        integration: u32,
        action: u32,
    },

    /// `#PING`
    Ping,

    /// `LOGOUT`
    Logout,

    /// A raw credential line sent during the login handshake
    Login(Bytes),
}

impl Command {
    /// Creates a set-style command without a value.
    ///
    /// # Example
    /// ```
    /// use lipbridge::protocol::types::{Action, Command, OUTPUT};
    /// let cmd = Command::execute(OUTPUT, 2, Action::Set).with_value(75.0);
    /// assert_eq!(cmd.serialize(), b"#OUTPUT,2,1,75\r\n");
    /// ```
    pub fn execute(mode: impl Into<String>, integration: u32, action: impl Into<u32>) -> Self {
        Command::Execute {
            mode: mode.into(),
            integration,
            action: action.into(),
            value: None,
            args: Vec::new(),
        }
    }

    /// Creates a query for the current state of an integration ID.
    pub fn query(mode: impl Into<String>, integration: u32, action: impl Into<u32>) -> Self {
        Command::Query {
            mode: mode.into(),
            integration,
            action: action.into(),
        }
    }

    /// Sets the value field of an `Execute` command. No effect on other shapes.
    pub fn with_value(mut self, new_value: f64) -> Self {
        if let Command::Execute { value, .. } = &mut self {
            *value = Some(new_value);
        }
        self
    }

    /// Appends a trailing argument to an `Execute` command.
    ///
    /// `None` arguments are kept in order but never written.
    pub fn with_arg(mut self, arg: Option<impl Into<String>>) -> Self {
        if let Command::Execute { args, .. } = &mut self {
            args.push(arg.map(Into::into));
        }
        self
    }

    /// Serializes the command to the bytes sent over the wire.
    pub fn serialize(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        self.serialize_into(&mut buf);
        buf
    }

    /// Serializes the command into an existing buffer.
    pub fn serialize_into(&self, buf: &mut Vec<u8>) {
        match self {
            Command::Execute {
                mode,
                integration,
                action,
                value,
                args,
            } => {
                buf.push(prefix::COMMAND);
                buf.extend_from_slice(format!("{},{},{}", mode, integration, action).as_bytes());
                if let Some(value) = value {
                    buf.extend_from_slice(format!(",{}", value).as_bytes());
                }
                for arg in args.iter().flatten() {
                    buf.push(b',');
                    buf.extend_from_slice(arg.as_bytes());
                }
                buf.extend_from_slice(CRLF);
            }
            Command::Query {
                mode,
                integration,
                action,
            } => {
                buf.push(prefix::QUERY);
                buf.extend_from_slice(format!("{},{},{}", mode, integration, action).as_bytes());
                buf.extend_from_slice(CRLF);
            }
            Command::Ping => buf.extend_from_slice(PING_LINE),
            Command::Logout => buf.extend_from_slice(LOGOUT_LINE),
            Command::Login(credential) => {
                buf.extend_from_slice(credential);
                buf.extend_from_slice(CRLF);
            }
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // never echo credentials into logs
            Command::Login(_) => write!(f, "<login>"),
            _ => {
                let bytes = self.serialize();
                let text = String::from_utf8_lossy(&bytes);
                write!(f, "{}", text.trim_end())
            }
        }
    }
}

/// A decoded `~MODE,INT,ACTION,VALUE` line.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub mode: String,
    pub integration: u32,
    pub action: u32,
    pub value: f64,
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "~{},{},{},{}",
            self.mode, self.integration, self.action, self.value
        )
    }
}
