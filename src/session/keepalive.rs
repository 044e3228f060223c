//! Background Keepalive
//!
//! Bridges (and the routers in front of them) drop Telnet sessions that sit
//! idle for too long. The keepalive task sends `#PING` on a fixed interval so
//! a session that is only listening for monitoring output stays up.
//!
//! ## Design
//!
//! The keepalive runs as a Tokio task and:
//! 1. Sleeps for the configured interval
//! 2. Sends `#PING` if the session is open (a closed session ignores it)
//! 3. Stops when its handle is stopped or dropped
//!
//! Pings share the session's write lock with every other command, so they
//! never interleave with a command line on the wire.

use crate::session::Session;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, trace, warn};

/// Default interval between pings
pub const DEFAULT_KEEPALIVE_INTERVAL: Duration = Duration::from_secs(60);

/// A handle to the running keepalive task.
///
/// When this handle is dropped, the task will be stopped.
#[derive(Debug)]
pub struct KeepAlive {
    /// Sender to signal shutdown
    shutdown_tx: watch::Sender<bool>,
}

impl KeepAlive {
    /// Starts pinging `session` every `interval`.
    ///
    /// A zero interval would ping in a tight loop, so it falls back to
    /// [`DEFAULT_KEEPALIVE_INTERVAL`].
    ///
    /// # Example
    ///
    /// ```ignore
    /// use lipbridge::session::{KeepAlive, Session};
    /// use std::sync::Arc;
    /// use std::time::Duration;
    ///
    /// let session = Arc::new(Session::new());
    /// let keepalive = KeepAlive::start(Arc::clone(&session), Duration::from_secs(60));
    ///
    /// // Pings go out in the background...
    ///
    /// // Dropping the handle stops them
    /// drop(keepalive);
    /// ```
    pub fn start(session: Arc<Session>, interval: Duration) -> Self {
        let interval = if interval.is_zero() {
            warn!(
                default_secs = DEFAULT_KEEPALIVE_INTERVAL.as_secs(),
                "Zero keepalive interval, using the default"
            );
            DEFAULT_KEEPALIVE_INTERVAL
        } else {
            interval
        };
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        tokio::spawn(keepalive_loop(session, interval, shutdown_rx));

        info!(interval_secs = interval.as_secs_f64(), "Keepalive started");

        Self { shutdown_tx }
    }

    /// Stops the keepalive.
    ///
    /// This is called automatically when the handle is dropped.
    pub fn stop(&self) {
        if self.shutdown_tx.send(true).is_ok() {
            debug!("Keepalive stopped");
        }
    }
}

impl Drop for KeepAlive {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn keepalive_loop(
    session: Arc<Session>,
    interval: Duration,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    loop {
        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            result = shutdown_rx.changed() => {
                if result.is_err() || *shutdown_rx.borrow() {
                    debug!("Keepalive received shutdown signal");
                    return;
                }
            }
        }

        if session.is_connected() {
            trace!("Sending keepalive ping");
            session.ping().await;
        }
    }
}

/// Starts the keepalive with the default interval.
pub fn start_keepalive(session: Arc<Session>) -> KeepAlive {
    KeepAlive::start(session, DEFAULT_KEEPALIVE_INTERVAL)
}
