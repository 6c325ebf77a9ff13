//! TCP-backed chunk sink
//!
//! Owns the accepted `TcpStream` for one client. Every write is bounded by
//! the configured write timeout; a slow client that blocks the socket longer
//! than that fails the write and gets its session reaped, so it can never
//! stall the broadcast sweep past the handshake bound.

use std::io;
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;

use super::ChunkSink;

/// Chunked writer over one client TCP connection
pub struct TcpChunkSink {
    stream: TcpStream,
    write_timeout: Duration,
}

impl TcpChunkSink {
    /// Take exclusive ownership of an accepted connection
    pub fn new(stream: TcpStream, write_timeout: Duration) -> Self {
        Self {
            stream,
            write_timeout,
        }
    }
}

impl ChunkSink for TcpChunkSink {
    async fn write_chunk(&mut self, chunk: &[u8]) -> io::Result<()> {
        match tokio::time::timeout(self.write_timeout, self.stream.write_all(chunk)).await {
            Ok(result) => result,
            Err(_) => Err(io::Error::new(
                io::ErrorKind::TimedOut,
                "client write timed out",
            )),
        }
    }

    async fn shutdown(&mut self) -> io::Result<()> {
        match tokio::time::timeout(self.write_timeout, self.stream.shutdown()).await {
            Ok(result) => result,
            Err(_) => Err(io::Error::new(
                io::ErrorKind::TimedOut,
                "client shutdown timed out",
            )),
        }
    }
}
