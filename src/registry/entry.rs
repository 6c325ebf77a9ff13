//! Per-session registry entry
//!
//! A [`SessionHandle`] is everything the scheduler knows about one client:
//! the sending half of the frame mailbox and the receiving half of the ack
//! channel. Handles are moved into the registry and never cloned, so a
//! session cannot appear twice.

use std::time::Duration;

use bytes::Bytes;
use tokio::sync::{mpsc, watch};

use crate::session::mailbox::{ConsumerMailbox, HandshakeAck};

/// Result of offering one frame to one session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum HandshakeOutcome {
    /// The consumer wrote the frame and is ready for the next cycle
    Delivered,
    /// The consumer reported a write failure, vanished, or timed out;
    /// the session must be removed and never offered to again
    Dead,
}

/// Scheduler-side handle to one streaming session
pub struct SessionHandle {
    id: u64,
    frame_tx: watch::Sender<Option<Bytes>>,
    ack_rx: mpsc::Receiver<HandshakeAck>,
}

impl SessionHandle {
    /// Create the handle and the matching consumer mailbox
    ///
    /// The handle goes into the registry; the mailbox is moved into the
    /// consumer task together with its connection.
    pub fn create(id: u64) -> (SessionHandle, ConsumerMailbox) {
        let (frame_tx, frame_rx) = watch::channel(None);
        let (ack_tx, ack_rx) = mpsc::channel(1);

        let handle = Self {
            id,
            frame_tx,
            ack_rx,
        };
        (handle, ConsumerMailbox::new(frame_rx, ack_tx))
    }

    /// Session ID
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Offer one frame payload and wait for the consumer's acknowledgment
    ///
    /// The wait is bounded by `timeout` (the explicit handshake bound); a
    /// session that neither acks nor reports death within it is treated as
    /// dead so one stuck consumer cannot stall the sweep forever.
    pub(crate) async fn offer(&mut self, payload: Bytes, timeout: Duration) -> HandshakeOutcome {
        if self.frame_tx.send(Some(payload)).is_err() {
            // Consumer dropped its mailbox without a final ack
            return HandshakeOutcome::Dead;
        }

        match tokio::time::timeout(timeout, self.ack_rx.recv()).await {
            Ok(Some(HandshakeAck::Ok)) => HandshakeOutcome::Delivered,
            Ok(Some(HandshakeAck::Dead)) | Ok(None) => HandshakeOutcome::Dead,
            Err(_) => {
                tracing::warn!(session_id = self.id, "Handshake timed out, dropping session");
                HandshakeOutcome::Dead
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_offer_delivered() {
        let (mut handle, mut mailbox) = SessionHandle::create(1);

        let consumer = tokio::spawn(async move {
            let payload = mailbox.next_frame().await.unwrap();
            assert_eq!(&payload[..], b"frame");
            mailbox.ack().await;
        });

        let outcome = handle
            .offer(Bytes::from_static(b"frame"), Duration::from_secs(1))
            .await;
        assert_eq!(outcome, HandshakeOutcome::Delivered);

        consumer.await.unwrap();
    }

    #[tokio::test]
    async fn test_offer_dead_ack() {
        let (mut handle, mut mailbox) = SessionHandle::create(2);

        let consumer = tokio::spawn(async move {
            mailbox.next_frame().await.unwrap();
            mailbox.report_dead().await;
        });

        let outcome = handle
            .offer(Bytes::from_static(b"frame"), Duration::from_secs(1))
            .await;
        assert_eq!(outcome, HandshakeOutcome::Dead);

        consumer.await.unwrap();
    }

    #[tokio::test]
    async fn test_offer_dead_when_consumer_vanished() {
        let (mut handle, mailbox) = SessionHandle::create(3);

        // Consumer went away without ever acking
        drop(mailbox);

        let outcome = handle
            .offer(Bytes::from_static(b"frame"), Duration::from_secs(1))
            .await;
        assert_eq!(outcome, HandshakeOutcome::Dead);
    }

    #[tokio::test]
    async fn test_offer_dead_on_timeout() {
        let (mut handle, mut mailbox) = SessionHandle::create(4);

        // Consumer receives the frame but never acknowledges it
        let consumer = tokio::spawn(async move {
            mailbox.next_frame().await.unwrap();
            std::future::pending::<()>().await;
        });

        let outcome = handle
            .offer(Bytes::from_static(b"frame"), Duration::from_millis(50))
            .await;
        assert_eq!(outcome, HandshakeOutcome::Dead);

        consumer.abort();
    }
}
