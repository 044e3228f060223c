//! Session Configuration
//!
//! Two pieces of configuration drive a session:
//!
//! - [`Endpoint`]: where to connect and how to log in. Captured by
//!   `Session::open` and replayed verbatim on reconnect.
//! - [`SessionConfig`]: per-session options that do not change between
//!   connections (post-login prompt, timeouts, reconnect delay).

use crate::protocol::types::DEFAULT_PROMPT;
use bytes::Bytes;
use std::fmt;
use std::time::Duration;

/// Default Telnet integration port
pub const DEFAULT_PORT: u16 = 23;

/// Default integration username
pub const DEFAULT_USERNAME: &[u8] = b"lutron";

/// Default integration password
pub const DEFAULT_PASSWORD: &[u8] = b"integration";

/// Remote bridge address and login credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct Endpoint {
    /// Bridge hostname or IP address
    pub host: String,

    /// Bridge port
    pub port: u16,

    /// Username sent after `login: `
    pub username: Bytes,

    /// Password sent after `password: `
    pub password: Bytes,
}

impl Endpoint {
    /// Endpoint for `host` with the default port and credentials.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_PORT,
            username: Bytes::from_static(DEFAULT_USERNAME),
            password: Bytes::from_static(DEFAULT_PASSWORD),
        }
    }

    /// Set the port
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the username and password
    pub fn with_credentials(
        mut self,
        username: impl Into<Bytes>,
        password: impl Into<Bytes>,
    ) -> Self {
        self.username = username.into();
        self.password = password.into();
        self
    }

    /// Returns the `host:port` address as a string
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Endpoint")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &String::from_utf8_lossy(&self.username))
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Options applied to every connection a session makes.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Marker the bridge prints once login has completed
    pub prompt: Bytes,

    /// Upper bound on establishing the TCP connection (None for no bound)
    pub connect_timeout: Option<Duration>,

    /// Upper bound on a single socket read (None for no timeout).
    /// An expired read is handled like the bridge closing the connection.
    pub read_timeout: Option<Duration>,

    /// Delay before the reconnect attempt that follows a read failure
    pub reconnect_delay: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            prompt: Bytes::from_static(DEFAULT_PROMPT),
            connect_timeout: Some(Duration::from_secs(10)),
            read_timeout: None,
            reconnect_delay: Duration::ZERO,
        }
    }
}

impl SessionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the post-login prompt marker
    pub fn with_prompt(mut self, prompt: impl Into<Bytes>) -> Self {
        self.prompt = prompt.into();
        self
    }

    /// Set the connection timeout
    pub fn with_connect_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the read timeout
    pub fn with_read_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Set the delay before reconnecting after a read failure
    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }
}
