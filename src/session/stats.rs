//! Session counters

use std::sync::atomic::{AtomicU64, Ordering};

/// Statistics for one bridge session, shared across all of its connections.
#[derive(Debug, Default)]
pub struct SessionStats {
    /// Successful logins (initial open and reconnects)
    pub connects: AtomicU64,
    /// Reconnects triggered by a failed read
    pub reconnect_attempts: AtomicU64,
    /// Response lines decoded and returned to callers
    pub responses_decoded: AtomicU64,
    /// Response lines that matched but failed to decode
    pub decode_errors: AtomicU64,
    /// Total bytes read
    pub bytes_read: AtomicU64,
    /// Total bytes written
    pub bytes_written: AtomicU64,
}

impl SessionStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connected(&self) {
        self.connects.fetch_add(1, Ordering::Relaxed);
    }

    pub fn reconnect_attempted(&self) {
        self.reconnect_attempts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn response_decoded(&self) {
        self.responses_decoded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn decode_failed(&self) {
        self.decode_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn bytes_read(&self, count: usize) {
        self.bytes_read.fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn bytes_written(&self, count: usize) {
        self.bytes_written.fetch_add(count as u64, Ordering::Relaxed);
    }
}
