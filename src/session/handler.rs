//! Bridge Session
//!
//! This module owns the single TCP connection to a Lutron bridge: the
//! connection state machine, the login handshake, the buffered "read until"
//! loop, the serialized write path and the reconnect-on-read-failure policy.
//!
//! ## Session Lifecycle
//!
//! ```text
//!            open()                 handshake ok
//! Closed ───────────────> Opening ───────────────> Opened
//!   ▲                        │                        │
//!   │    connect/handshake   │                        │ logout(),
//!   └────────── failed ──────┘                        │ I/O failure
//!   ▲                                                 │
//!   └─────────────────────────────────────────────────┘
//! ```
//!
//! A read failure in the `Opened` state (peer closed, socket error, read
//! timeout) closes the session and immediately calls `open()` once more with
//! the endpoint captured by the last successful `open()` call.
//!
//! ## Locking
//!
//! Two independent async mutexes guard one socket:
//!
//! - the read side (socket read half + read buffer), taken by `read()`
//! - the write side (socket write half), taken by `write()`, `query()`,
//!   `ping()` and `logout()`
//!
//! `open()` takes both, read side first, for the whole handshake. The state
//! itself is an atomic so `is_connected()` never waits on either lock, and the
//! last endpoint sits behind its own short-lived lock.
//!
//! Each connection carries a `watch` close signal. `logout()` and a failed
//! write fire it, so a `read()` parked on an idle socket returns at once and
//! releases the read half instead of holding it until the bridge hangs up.
//!
//! ## Buffer Management
//!
//! Incoming bytes accumulate in a `BytesMut`. A successful match splits the
//! consumed prefix off the front; anything after it stays buffered for the
//! next call, so one socket read may satisfy several `read()` calls and one
//! response may need several socket reads.

use crate::protocol::types::{Command, Response, LOGIN_PROMPT, PASSWORD_PROMPT, READ_SIZE};
use crate::protocol::{decode_response, Match, Matcher};
use crate::session::config::{Endpoint, SessionConfig};
use crate::session::stats::SessionStats;
use bytes::{Bytes, BytesMut};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::{watch, Mutex};
use tokio::time::timeout;
use tracing::{debug, info, trace, warn};

/// Initial read buffer capacity
const INITIAL_BUFFER_SIZE: usize = 4096;

/// Connection state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ConnectionState {
    /// No connection; the initial state and the state after any failure
    Closed = 1,
    /// `open()` is connecting or logging in
    Opening = 2,
    /// Logged in; reads and writes are live
    Opened = 3,
}

impl ConnectionState {
    fn from_u8(value: u8) -> Self {
        match value {
            2 => ConnectionState::Opening,
            3 => ConnectionState::Opened,
            _ => ConnectionState::Closed,
        }
    }
}

/// Errors reported by [`Session::open`].
///
/// These are informational: every failure has already been logged and the
/// session has been returned to `Closed` by the time the caller sees one.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// TCP connect failed
    #[error("connection to {address} failed: {source}")]
    Connect {
        address: String,
        #[source]
        source: std::io::Error,
    },

    /// TCP connect did not complete in time
    #[error("connection to {0} timed out")]
    ConnectTimeout(String),

    /// The bridge went away before sending the expected prompt
    #[error("login handshake failed waiting for {stage} prompt")]
    Handshake { stage: &'static str },

    /// I/O error while writing
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// No socket to write to
    #[error("not connected")]
    NotConnected,
}

/// Everything guarded by the read-side lock.
struct ReadSide {
    stream: Option<OwnedReadHalf>,
    buffer: BytesMut,
    /// Flips to true when the connection is closed from the write side
    closed: Option<watch::Receiver<bool>>,
}

/// Everything guarded by the write-side lock.
struct WriteSide {
    stream: Option<OwnedWriteHalf>,
    closed: Option<watch::Sender<bool>>,
}

impl WriteSide {
    /// Wakes any read parked on this connection and hands back the write half.
    fn close(&mut self) -> Option<OwnedWriteHalf> {
        if let Some(tx) = self.closed.take() {
            let _ = tx.send(true);
        }
        self.stream.take()
    }
}

/// Puts a cancelled `open()` back into `Closed` so later opens are not ignored.
struct OpeningGuard<'a> {
    state: &'a AtomicU8,
    armed: bool,
}

impl Drop for OpeningGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.state.store(ConnectionState::Closed as u8, Ordering::Release);
        }
    }
}

/// A session with one Lutron bridge.
///
/// The session outlives individual connections: after `logout()` or a
/// failure it is simply `Closed` again and may be re-opened. Share it between
/// tasks with an `Arc`; every method takes `&self`.
pub struct Session {
    config: SessionConfig,
    state: AtomicU8,
    reader: Mutex<ReadSide>,
    writer: Mutex<WriteSide>,
    /// Last endpoint passed to `open()`, replayed on reconnect
    endpoint: RwLock<Option<Endpoint>>,
    stats: Arc<SessionStats>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    /// Creates a closed session with the default configuration.
    pub fn new() -> Self {
        Self::with_config(SessionConfig::default())
    }

    /// Creates a closed session.
    pub fn with_config(config: SessionConfig) -> Self {
        Self {
            config,
            state: AtomicU8::new(ConnectionState::Closed as u8),
            reader: Mutex::new(ReadSide {
                stream: None,
                buffer: BytesMut::with_capacity(INITIAL_BUFFER_SIZE),
                closed: None,
            }),
            writer: Mutex::new(WriteSide {
                stream: None,
                closed: None,
            }),
            endpoint: RwLock::new(None),
            stats: Arc::new(SessionStats::new()),
        }
    }

    /// The configuration this session was created with.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Counters shared by every connection this session makes.
    pub fn stats(&self) -> &Arc<SessionStats> {
        &self.stats
    }

    /// The current connection state, read without taking any lock.
    pub fn state(&self) -> ConnectionState {
        ConnectionState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Returns true once the login handshake has completed.
    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Opened
    }

    /// The endpoint captured by the most recent `open()` call.
    ///
    /// Never waits on socket I/O, even while a `read()` is pending.
    pub fn endpoint(&self) -> Option<Endpoint> {
        self.endpoint
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn remember_endpoint(&self, endpoint: &Endpoint) {
        *self.endpoint.write().unwrap_or_else(PoisonError::into_inner) = Some(endpoint.clone());
    }

    fn set_state(&self, state: ConnectionState) {
        self.state.store(state as u8, Ordering::Release);
    }

    /// Connects to the bridge and logs in.
    ///
    /// Does nothing unless the session is `Closed`. The endpoint is stored
    /// for reconnects before any I/O happens. On failure the session is back
    /// in `Closed` and the error describes which step failed; callers that
    /// only poll [`Session::is_connected`] can ignore it.
    pub async fn open(&self, endpoint: Endpoint) -> Result<(), SessionError> {
        let mut read = self.reader.lock().await;
        let mut write = self.writer.lock().await;

        if self.state() != ConnectionState::Closed {
            trace!(state = ?self.state(), "open() ignored, session not closed");
            return Ok(());
        }
        self.set_state(ConnectionState::Opening);
        let mut interrupted = OpeningGuard {
            state: &self.state,
            armed: true,
        };
        self.remember_endpoint(&endpoint);

        let result = self.connect_and_login(&mut read, &mut write, &endpoint).await;
        interrupted.armed = false;

        match result {
            Ok(()) => {
                self.set_state(ConnectionState::Opened);
                self.stats.connected();
                info!(bridge = %endpoint.address(), "Logged in to Lutron bridge");
                Ok(())
            }
            Err(e) => {
                warn!(bridge = %endpoint.address(), error = %e, "Error opening connection to Lutron bridge");
                read.stream = None;
                read.closed = None;
                write.close();
                self.set_state(ConnectionState::Closed);
                Err(e)
            }
        }
    }

    /// Convenience wrapper around [`Session::open`].
    pub async fn open_with(
        &self,
        host: impl Into<String>,
        port: u16,
        username: impl Into<Bytes>,
        password: impl Into<Bytes>,
    ) -> Result<(), SessionError> {
        let endpoint = Endpoint::new(host)
            .with_port(port)
            .with_credentials(username, password);
        self.open(endpoint).await
    }

    async fn connect_and_login(
        &self,
        read: &mut ReadSide,
        write: &mut WriteSide,
        endpoint: &Endpoint,
    ) -> Result<(), SessionError> {
        let address = endpoint.address();
        debug!(bridge = %address, "Connecting to Lutron bridge");

        let connect = TcpStream::connect((endpoint.host.as_str(), endpoint.port));
        let stream = match self.config.connect_timeout {
            Some(limit) => timeout(limit, connect)
                .await
                .map_err(|_| SessionError::ConnectTimeout(address.clone()))?,
            None => connect.await,
        }
        .map_err(|source| SessionError::Connect {
            address: address.clone(),
            source,
        })?;

        let (read_half, write_half) = stream.into_split();
        let (closed_tx, closed_rx) = watch::channel(false);
        read.stream = Some(read_half);
        read.closed = Some(closed_rx);
        read.buffer.clear();
        write.stream = Some(write_half);
        write.closed = Some(closed_tx);

        self.read_until(read, &Matcher::literal(LOGIN_PROMPT))
            .await
            .ok_or(SessionError::Handshake { stage: "login" })?;
        self.write_command(write, &Command::Login(endpoint.username.clone()))
            .await?;

        self.read_until(read, &Matcher::literal(PASSWORD_PROMPT))
            .await
            .ok_or(SessionError::Handshake { stage: "password" })?;
        self.write_command(write, &Command::Login(endpoint.password.clone()))
            .await?;

        self.read_until(read, &Matcher::Literal(self.config.prompt.clone()))
            .await
            .ok_or(SessionError::Handshake { stage: "command" })?;

        Ok(())
    }

    /// Waits for the next response line from the bridge.
    ///
    /// Returns `None` when the session is not open, when a matched line
    /// fails to decode, or when the connection was lost. In the last case the
    /// session has already tried to reconnect once; call `read()` again to
    /// pick up the next response.
    pub async fn read(&self) -> Option<Response> {
        {
            let mut read = self.reader.lock().await;
            if !self.is_connected() {
                return None;
            }

            if let Some(m) = self.read_until(&mut read, &Matcher::response()).await {
                return self.decode(&m);
            }
            read.stream = None;
            read.closed = None;
            // logout() or a failed write already closed the session
            if self.state() != ConnectionState::Opened {
                return None;
            }
            self.set_state(ConnectionState::Closed);
        }

        let endpoint = self.endpoint();

        if let Some(endpoint) = endpoint {
            self.reconnect(endpoint).await;
        }
        None
    }

    fn decode(&self, m: &Match) -> Option<Response> {
        match decode_response(m) {
            Ok(response) => {
                self.stats.response_decoded();
                trace!(response = %response, "Decoded response");
                Some(response)
            }
            Err(e) => {
                self.stats.decode_failed();
                warn!(
                    line = %String::from_utf8_lossy(m.consumed()).trim(),
                    error = %e,
                    "Could not decode response from Lutron bridge"
                );
                None
            }
        }
    }

    async fn reconnect(&self, endpoint: Endpoint) {
        self.stats.reconnect_attempted();
        info!(bridge = %endpoint.address(), "Reconnecting to Lutron bridge");

        if !self.config.reconnect_delay.is_zero() {
            tokio::time::sleep(self.config.reconnect_delay).await;
        }

        // open() has already logged the cause
        let _ = self.open(endpoint).await;
    }

    /// Reads from the socket until `matcher` is found in the buffer.
    ///
    /// Returns `None` if the peer closed the connection, the read failed, the
    /// read timeout expired or the session was closed from the write side.
    async fn read_until(&self, side: &mut ReadSide, matcher: &Matcher) -> Option<Match> {
        let mut chunk = [0u8; READ_SIZE];

        loop {
            if let Some(m) = matcher.take(&mut side.buffer) {
                trace!(
                    consumed = m.consumed().len(),
                    remaining = side.buffer.len(),
                    "Matched"
                );
                return Some(m);
            }

            let stream = side.stream.as_mut()?;
            let pending = read_chunk(stream, side.closed.as_mut(), &mut chunk);
            let outcome = match self.config.read_timeout {
                Some(limit) => match timeout(limit, pending).await {
                    Ok(outcome) => outcome,
                    Err(_) => {
                        warn!(timeout_ms = limit.as_millis(), "Timed out reading from Lutron bridge");
                        return None;
                    }
                },
                None => pending.await,
            };
            let Some(result) = outcome else {
                debug!(buffered = side.buffer.len(), "Read interrupted, session closed");
                return None;
            };

            match result {
                Ok(0) => {
                    warn!(buffered = side.buffer.len(), "Lutron bridge closed the connection");
                    return None;
                }
                Ok(n) => {
                    side.buffer.extend_from_slice(&chunk[..n]);
                    self.stats.bytes_read(n);
                    trace!(bytes = n, buffered = side.buffer.len(), "Read data");
                }
                Err(e) => {
                    warn!(error = %e, "Error reading from Lutron bridge");
                    return None;
                }
            }
        }
    }

    /// Sends a set-style command: `#MODE,INT,ACTION[,VALUE][,ARG...]`.
    pub async fn write(
        &self,
        mode: &str,
        integration: u32,
        action: impl Into<u32>,
        value: Option<f64>,
        args: &[&str],
    ) {
        let mut command = Command::execute(mode, integration, action);
        if let Some(value) = value {
            command = command.with_value(value);
        }
        for arg in args {
            command = command.with_arg(Some(*arg));
        }
        self.send(&command).await;
    }

    /// Asks the bridge for the current state: `?MODE,INT,ACTION`.
    pub async fn query(&self, mode: &str, integration: u32, action: impl Into<u32>) {
        let command = Command::query(mode, integration, action);
        debug!(command = %command, "Sending query");
        self.send(&command).await;
    }

    /// Sends `#PING` to keep an idle session alive.
    pub async fn ping(&self) {
        self.send(&Command::Ping).await;
    }

    /// Sends any command over the write side.
    ///
    /// A no-op unless the session is `Opened`. A write failure is logged and
    /// closes the session; it stays closed until the caller calls `open()`.
    pub async fn send(&self, command: &Command) {
        let mut write = self.writer.lock().await;
        if !self.is_connected() {
            return;
        }

        if let Err(e) = self.write_command(&mut write, command).await {
            warn!(command = %command, error = %e, "Error writing out to Lutron bridge");
            self.set_state(ConnectionState::Closed);
            write.close();
        }
    }

    /// Logs out and releases the connection.
    pub async fn logout(&self) {
        let mut write = self.writer.lock().await;
        if !self.is_connected() {
            return;
        }

        if let Err(e) = self.write_command(&mut write, &Command::Logout).await {
            warn!(error = %e, "Error sending logout to Lutron bridge");
        }
        self.set_state(ConnectionState::Closed);
        if let Some(mut stream) = write.close() {
            let _ = stream.shutdown().await;
        }

        // A read in flight drops the read half itself once the close signal lands.
        if let Ok(mut read) = self.reader.try_lock() {
            read.stream = None;
            read.closed = None;
            read.buffer.clear();
        }
        info!("Logged out of Lutron bridge");
    }

    async fn write_command(
        &self,
        side: &mut WriteSide,
        command: &Command,
    ) -> Result<(), SessionError> {
        let stream = side.stream.as_mut().ok_or(SessionError::NotConnected)?;
        let bytes = command.serialize();
        stream.write_all(&bytes).await?;
        stream.flush().await?;
        self.stats.bytes_written(bytes.len());
        trace!(command = %command, bytes = bytes.len(), "Sent command");
        Ok(())
    }
}

/// Reads one chunk, or returns `None` if the connection is closed first.
async fn read_chunk(
    stream: &mut OwnedReadHalf,
    closed: Option<&mut watch::Receiver<bool>>,
    chunk: &mut [u8],
) -> Option<std::io::Result<usize>> {
    tokio::select! {
        result = stream.read(chunk) => Some(result),
        _ = wait_closed(closed) => None,
    }
}

async fn wait_closed(closed: Option<&mut watch::Receiver<bool>>) {
    match closed {
        // a dropped sender means the connection is gone too
        Some(rx) => {
            let _ = rx.wait_for(|closed| *closed).await;
        }
        None => std::future::pending().await,
    }
}
