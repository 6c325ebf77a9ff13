//! Per-client streaming session
//!
//! A session is one connected client: a [`StreamConsumer`] task that owns the
//! client connection exclusively and a [`ConsumerMailbox`] it shares with the
//! broadcast scheduler. The scheduler keeps the matching
//! [`SessionHandle`](crate::registry::SessionHandle) in the registry and
//! drives the per-frame handshake through it.

pub mod consumer;
pub mod mailbox;

pub use consumer::StreamConsumer;
pub use mailbox::{ConsumerMailbox, HandshakeAck};
