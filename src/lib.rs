//! MJPEG multipart streaming server for constrained devices
//!
//! A single frame producer fans each captured JPEG out to every connected
//! HTTP client as one part of a `multipart/x-mixed-replace` stream. The
//! design trades maximum frame rate for a tiny memory footprint: exactly one
//! frame is in flight at any time, handed to each consumer in turn through a
//! synchronous per-session handshake.
//!
//! # Architecture
//!
//! ```text
//!                   Arc<SessionRegistry>
//!               ┌──────────────────────────┐
//!               │ sessions: Vec<Handle>    │◄── admit() (capacity gated)
//!               │ wake: Notify             │
//!               └────────────┬─────────────┘
//!                            │ broadcast_sweep()
//!          ┌─────────────────┼─────────────────┐
//!          ▼                 ▼                 ▼
//!     [Consumer]        [Consumer]        [Consumer]
//!     mailbox.recv      mailbox.recv      mailbox.recv
//!          │                 │                 │
//!          └──► write multipart part ──► ack Ok | Dead
//!
//!   [BroadcastScheduler]: Idle ─► Capture ─► Sweep ─► Throttle ─┐
//!                          ▲                                    │
//!                          └──────── registry empty ◄───────────┘
//! ```
//!
//! The scheduler idles completely (no polling, no capture) while no client is
//! connected; the admission gate wakes it when the first client arrives. A
//! consumer that fails to write is reaped during the sweep and never visited
//! again.
//!
//! # Zero-copy design
//!
//! Frame payloads are `bytes::Bytes`: every consumer in a sweep reads the
//! same reference-counted allocation, and the scheduler keeps sole ownership
//! of the `Frame` token it must return to the camera driver.

pub mod camera;
pub mod error;
pub mod registry;
pub mod scheduler;
pub mod server;
pub mod session;
pub mod stats;
pub mod supervisor;
pub mod transport;

pub use camera::{Frame, FrameSource};
pub use error::{Error, Result};
pub use registry::{AdmissionError, SessionRegistry};
pub use scheduler::{BroadcastScheduler, SchedulerConfig};
pub use server::{MjpegServer, ServerConfig};
pub use stats::StreamerStats;
