//! Handshake channel pair between scheduler and consumer
//!
//! Two typed halves per session:
//!
//! - scheduler → consumer: a `watch` channel holding the latest frame
//!   payload. Capacity one with overwrite, so a consumer that falls behind
//!   only ever sees the most recent frame (latest-frame-wins, no queueing).
//! - consumer → scheduler: a capacity-1 `mpsc` channel carrying the
//!   [`HandshakeAck`] for the frame just offered.
//!
//! The scheduler blocks on the ack after every send, which is what keeps a
//! single frame buffer sufficient for any number of clients.

use bytes::Bytes;
use tokio::sync::{mpsc, watch};

/// Consumer's answer to an offered frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeAck {
    /// Frame written, ready for the next cycle
    Ok,
    /// Connection write failed; drop this session and never offer again
    Dead,
}

/// The consumer-side endpoints of a session's handshake channels
pub struct ConsumerMailbox {
    frame_rx: watch::Receiver<Option<Bytes>>,
    ack_tx: mpsc::Sender<HandshakeAck>,
}

impl ConsumerMailbox {
    pub(crate) fn new(
        frame_rx: watch::Receiver<Option<Bytes>>,
        ack_tx: mpsc::Sender<HandshakeAck>,
    ) -> Self {
        Self { frame_rx, ack_tx }
    }

    /// Wait for the next offered frame payload
    ///
    /// Returns `None` when the scheduler has dropped this session's handle;
    /// the consumer must terminate.
    pub async fn next_frame(&mut self) -> Option<Bytes> {
        loop {
            self.frame_rx.changed().await.ok()?;
            let slot = self.frame_rx.borrow_and_update().clone();
            if let Some(payload) = slot {
                return Some(payload);
            }
        }
    }

    /// Acknowledge the current frame as written
    ///
    /// Returns `false` if the scheduler side is gone.
    pub async fn ack(&self) -> bool {
        self.ack_tx.send(HandshakeAck::Ok).await.is_ok()
    }

    /// Report a fatal write failure, best effort
    ///
    /// Sent as the final message before the consumer ceases execution, so
    /// the scheduler's pending handshake wait resolves immediately.
    pub async fn report_dead(&self) {
        let _ = self.ack_tx.send(HandshakeAck::Dead).await;
    }
}
