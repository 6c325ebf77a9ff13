//! Stream consumer task
//!
//! One task per connected client. The consumer owns its connection
//! exclusively (the sink is moved in, never shared) and participates in the
//! per-frame handshake: receive a payload, write it as one multipart part,
//! acknowledge. On any write failure it reports `Dead` one final time,
//! releases the connection, and ceases execution permanently; the scheduler
//! does the actual registry removal during its sweep.

use crate::session::mailbox::ConsumerMailbox;
use crate::transport::{ChunkSink, MultipartWriter};

/// Per-session consumer bound to one client connection
pub struct StreamConsumer<T: ChunkSink> {
    id: u64,
    mailbox: ConsumerMailbox,
    writer: MultipartWriter<T>,
}

impl<T: ChunkSink> StreamConsumer<T> {
    /// Build a consumer from its mailbox and exclusively-owned sink
    pub fn new(id: u64, mailbox: ConsumerMailbox, sink: T) -> Self {
        Self {
            id,
            mailbox,
            writer: MultipartWriter::new(sink),
        }
    }

    /// Serve frames until the connection fails or the scheduler drops us
    pub async fn run(mut self) {
        tracing::debug!(session_id = self.id, "Consumer started");

        loop {
            let Some(payload) = self.mailbox.next_frame().await else {
                // Scheduler dropped our handle; nothing left to ack
                tracing::debug!(session_id = self.id, "Session dropped, consumer exiting");
                break;
            };

            // An empty payload is never emitted as a part
            if payload.is_empty() {
                if !self.mailbox.ack().await {
                    break;
                }
                continue;
            }

            match self.writer.write_frame(&payload).await {
                Ok(()) => {
                    if !self.mailbox.ack().await {
                        break;
                    }
                }
                Err(e) => {
                    tracing::debug!(
                        session_id = self.id,
                        error = %e,
                        "Write failed, terminating consumer"
                    );
                    self.mailbox.report_dead().await;
                    let _ = self.writer.shutdown().await;
                    break;
                }
            }
        }

        tracing::debug!(session_id = self.id, "Consumer finished");
    }
}
