//! Scheduler configuration

use std::time::Duration;

/// Broadcast scheduler options
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Fixed sleep between capture cycles
    ///
    /// Bounds the capture rate independently of client count.
    pub throttle: Duration,

    /// Upper bound on waiting for one consumer's handshake acknowledgment
    ///
    /// Kept above the transport write timeout so the transport bound fires
    /// first; this one is the backstop that stops a stuck consumer from
    /// stalling every other session. A timed-out session is reaped.
    pub handshake_timeout: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            throttle: Duration::from_millis(15),
            handshake_timeout: Duration::from_secs(12),
        }
    }
}

impl SchedulerConfig {
    /// Set the inter-cycle throttle
    pub fn throttle(mut self, throttle: Duration) -> Self {
        self.throttle = throttle;
        self
    }

    /// Set the handshake acknowledgment bound
    pub fn handshake_timeout(mut self, timeout: Duration) -> Self {
        self.handshake_timeout = timeout;
        self
    }
}
