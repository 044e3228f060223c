//! # lipbridge - Lutron Integration Protocol Client
//!
//! lipbridge talks to a Lutron bridge (Caseta Smart Bridge PRO, RA2 Select
//! and friends) over the Telnet integration port. It logs in, keeps one TCP
//! session open, sends commands and queries, and decodes the monitoring
//! lines the bridge pushes back.
//!
//! ## Features
//!
//! - **Async I/O**: Built on Tokio; reads and writes proceed independently
//! - **Buffered Matching**: Responses split across packets, or packed
//!   several to a packet, are reassembled from one `BytesMut` buffer
//! - **Self-Healing**: A lost connection is re-opened on the next read
//! - **Keepalive**: Optional background `#PING` to survive idle timeouts
//! - **Inventory**: Maps the app's JSON integration report to device IDs
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                              lipbridge                                  │
//! │                                                                         │
//! │  ┌─────────────┐    ┌──────────────────────────────────────────────┐    │
//! │  │ Integration │    │                  Session                     │    │
//! │  │ Report      │    │  ┌────────────┐ ┌────────────┐ ┌───────────┐ │    │
//! │  │ (inventory) │    │  │ State      │ │ Read side  │ │ Write side│ │    │
//! │  └──────┬──────┘    │  │ (atomic)   │ │ Mutex      │ │ Mutex     │ │    │
//! │         │ IDs       │  └────────────┘ └─────┬──────┘ └─────▲─────┘ │    │
//! │         ▼           └───────────────────────┼──────────────┼───────┘    │
//! │     caller ─────────────────────────────────┼──────────────┘            │
//! │                                             ▼                           │
//! │                     ┌────────────────────────────────────────┐          │
//! │                     │ protocol: Matcher / Command / Response │          │
//! │                     └────────────────────────────────────────┘          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```ignore
//! use lipbridge::protocol::{Action, OUTPUT};
//! use lipbridge::session::{start_keepalive, Endpoint, Session};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let session = Arc::new(Session::new());
//!     session.open(Endpoint::new("192.168.1.20")).await.ok();
//!     let _keepalive = start_keepalive(Arc::clone(&session));
//!
//!     // Dim zone 2 to 75%
//!     session.write(OUTPUT, 2, Action::Set, Some(75.0), &[]).await;
//!
//!     loop {
//!         if let Some(response) = session.read().await {
//!             println!("{}", response);
//!         }
//!     }
//! }
//! ```
//!
//! ## Wire Format
//!
//! | Direction | Shape                              | Example                  |
//! |-----------|------------------------------------|--------------------------|
//! | Inbound   | `~MODE,INT,ACTION,VALUE`           | `~OUTPUT,2,1,100.00`     |
//! | Outbound  | `#MODE,INT,ACTION[,VALUE][,ARG..]` | `#OUTPUT,2,1,75`         |
//! | Outbound  | `?MODE,INT,ACTION`                 | `?OUTPUT,2,1`            |
//! | Outbound  | `#PING`, `LOGOUT`                  |                          |
//!
//! ## Module Overview
//!
//! - [`protocol`]: Wire constants, commands, response matching and decoding
//! - [`session`]: Connection state machine, login, read/write, reconnect
//! - [`inventory`]: Integration report loader

pub mod inventory;
pub mod protocol;
pub mod session;

// Re-export commonly used types for convenience
pub use inventory::{load_integration_report, DeviceDescriptor, DeviceKind, InventoryError};
pub use protocol::{Action, Button, Command, ParseError, Response, DEVICE, OUTPUT};
pub use session::{ConnectionState, Endpoint, KeepAlive, Session, SessionConfig, SessionError};

/// The default port of the bridge's Telnet integration interface
pub const DEFAULT_PORT: u16 = session::DEFAULT_PORT;

/// Version of lipbridge
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
