//! Streaming statistics
//!
//! Cheap atomic counters shared between the admission gate and the
//! scheduler. Read for periodic logging; never consulted on the hot path
//! beyond a relaxed increment.

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for the whole streamer
#[derive(Debug, Default)]
pub struct StreamerStats {
    frames_captured: AtomicU64,
    capture_misses: AtomicU64,
    parts_delivered: AtomicU64,
    sessions_admitted: AtomicU64,
    sessions_rejected: AtomicU64,
    sessions_reaped: AtomicU64,
}

impl StreamerStats {
    /// Create zeroed counters
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_capture(&self) {
        self.frames_captured.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_capture_miss(&self) {
        self.capture_misses.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_sweep(&self, delivered: usize, reaped: usize) {
        self.parts_delivered
            .fetch_add(delivered as u64, Ordering::Relaxed);
        self.sessions_reaped
            .fetch_add(reaped as u64, Ordering::Relaxed);
    }

    pub(crate) fn record_admitted(&self) {
        self.sessions_admitted.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_rejected(&self) {
        self.sessions_rejected.fetch_add(1, Ordering::Relaxed);
    }

    /// Frames successfully captured
    pub fn frames_captured(&self) -> u64 {
        self.frames_captured.load(Ordering::Relaxed)
    }

    /// Capture attempts the driver declined (transient misses)
    pub fn capture_misses(&self) -> u64 {
        self.capture_misses.load(Ordering::Relaxed)
    }

    /// Multipart parts delivered across all sessions
    pub fn parts_delivered(&self) -> u64 {
        self.parts_delivered.load(Ordering::Relaxed)
    }

    /// Sessions accepted by the admission gate
    pub fn sessions_admitted(&self) -> u64 {
        self.sessions_admitted.load(Ordering::Relaxed)
    }

    /// Sessions rejected at capacity
    pub fn sessions_rejected(&self) -> u64 {
        self.sessions_rejected.load(Ordering::Relaxed)
    }

    /// Sessions removed after a failed handshake
    pub fn sessions_reaped(&self) -> u64 {
        self.sessions_reaped.load(Ordering::Relaxed)
    }
}
