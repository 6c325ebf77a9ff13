//! Connection transport seam and multipart framing
//!
//! The HTTP transport is an external collaborator: the frame path only
//! depends on [`ChunkSink`], a chunked-write interface with the per-consumer
//! write timeout owned by the implementation. [`MultipartWriter`] layers the
//! `multipart/x-mixed-replace` part framing on top:
//!
//! ```text
//! --<boundary>\r\n
//! Content-Type: image/jpeg\r\n
//! \r\n
//! <raw JPEG bytes>\r\n
//! ```

use std::io;

use bytes::Bytes;

pub mod tcp;

pub use tcp::TcpChunkSink;

/// Boundary token separating multipart frames
pub const PART_BOUNDARY: &str = "123456789000000000000987654321";

/// Chunked-write half of one client connection
///
/// Implementations own the connection resource exclusively and enforce their
/// own write timeout; a timed-out write surfaces as an ordinary I/O error and
/// terminates the session like any other write failure.
pub trait ChunkSink: Send {
    /// Write one chunk fully, or fail
    fn write_chunk(&mut self, chunk: &[u8]) -> impl std::future::Future<Output = io::Result<()>> + Send;

    /// Flush and close the connection
    fn shutdown(&mut self) -> impl std::future::Future<Output = io::Result<()>> + Send;
}

/// Build the per-part prefix (boundary marker + content headers)
pub fn part_header() -> Bytes {
    Bytes::from(format!(
        "--{}\r\nContent-Type: image/jpeg\r\n\r\n",
        PART_BOUNDARY
    ))
}

/// Writes JPEG frames as multipart parts over a [`ChunkSink`]
///
/// The part prefix is assembled once; the JPEG payload is written as its own
/// chunk so it is never copied into a framing buffer.
pub struct MultipartWriter<T: ChunkSink> {
    sink: T,
    header: Bytes,
}

impl<T: ChunkSink> MultipartWriter<T> {
    /// Wrap a sink
    pub fn new(sink: T) -> Self {
        Self {
            sink,
            header: part_header(),
        }
    }

    /// Write one frame as a complete multipart part
    pub async fn write_frame(&mut self, payload: &[u8]) -> io::Result<()> {
        self.sink.write_chunk(&self.header).await?;
        self.sink.write_chunk(payload).await?;
        self.sink.write_chunk(b"\r\n").await?;
        Ok(())
    }

    /// Close the underlying connection
    pub async fn shutdown(&mut self) -> io::Result<()> {
        self.sink.shutdown().await
    }
}
