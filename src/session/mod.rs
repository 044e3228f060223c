//! Bridge Session Module
//!
//! This module manages the persistent Telnet-style session with a Lutron
//! bridge. One [`Session`] owns one TCP connection at a time and survives
//! across reconnects.
//!
//! ## Architecture
//!
//! ```text
//!   open() ──────────────┐
//!                        ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Session                              │
//! │                                                             │
//! │  state (atomic)    endpoint + credentials (for reconnect)   │
//! │                                                             │
//! │  ┌──────────── read lock ─────────┐  ┌──── write lock ────┐ │
//! │  │ read half ──> BytesMut buffer  │  │     write half     │ │
//! │  │        read_until(Matcher)     │  │  Command::serialize│ │
//! │  └───────────────┬────────────────┘  └─────────▲──────────┘ │
//! └──────────────────┼─────────────────────────────┼────────────┘
//!                    ▼                             │
//!              read() -> Response      write/query/ping/logout
//!                    │                             ▲
//!                    │ connection lost             │
//!                    └──> reconnect once      KeepAlive (optional)
//! ```
//!
//! ## Example
//!
//! ```ignore
//! use lipbridge::protocol::{Action, OUTPUT};
//! use lipbridge::session::{Endpoint, Session};
//!
//! let session = Session::new();
//! session.open(Endpoint::new("192.168.1.20")).await?;
//!
//! session.write(OUTPUT, 2, Action::Set, Some(75.0), &[]).await;
//! while let Some(response) = session.read().await {
//!     println!("{}", response);
//! }
//! ```

pub mod config;
pub mod handler;
pub mod keepalive;
pub mod stats;

// Re-export commonly used types
pub use config::{Endpoint, SessionConfig, DEFAULT_PASSWORD, DEFAULT_PORT, DEFAULT_USERNAME};
pub use handler::{ConnectionState, Session, SessionError};
pub use keepalive::{start_keepalive, KeepAlive, DEFAULT_KEEPALIVE_INTERVAL};
pub use stats::SessionStats;
