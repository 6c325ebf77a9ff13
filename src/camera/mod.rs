//! Camera frame source seam
//!
//! The capture driver is an external collaborator: the crate only depends on
//! the [`FrameSource`] trait. A frame is owned by whoever acquired it until
//! it is handed back with [`FrameSource::release`] — `release` consumes the
//! [`Frame`] by value, so releasing the same frame twice is a compile error
//! rather than a runtime policy.

use bytes::Bytes;

/// One captured JPEG image
///
/// The payload is reference-counted (`Bytes`), so consumers can read it
/// during the broadcast sweep without copying while the scheduler keeps sole
/// ownership of the `Frame` token itself.
#[derive(Debug)]
pub struct Frame {
    data: Bytes,
    seq: u64,
}

impl Frame {
    /// Create a frame from raw JPEG bytes and a capture sequence number
    pub fn new(data: Bytes, seq: u64) -> Self {
        Self { data, seq }
    }

    /// Length of the JPEG payload in bytes
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the payload is empty (never broadcast)
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Capture sequence number
    pub fn seq(&self) -> u64 {
        self.seq
    }

    /// Cheap reference-counted handle to the payload
    pub fn payload(&self) -> Bytes {
        self.data.clone()
    }
}

/// Capture driver interface
///
/// `acquire` returning `None` signals a transient miss (sensor busy, no
/// buffer ready); the scheduler skips the cycle and retries. It is never
/// treated as fatal.
pub trait FrameSource: Send + Sync {
    /// Take the next frame from the driver, if one is ready
    fn acquire(&self) -> impl std::future::Future<Output = Option<Frame>> + Send;

    /// Return a frame's buffer to the driver
    fn release(&self, frame: Frame) -> impl std::future::Future<Output = ()> + Send;
}
