//! Minimal HTTP/1.1 handling
//!
//! Just enough HTTP to serve one endpoint: parse the request line, drain the
//! headers, and write fixed responses. The streamed response itself is plain
//! `multipart/x-mixed-replace` written chunk by chunk by the consumer.

use std::io;

use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::transport::{ChunkSink, PART_BOUNDARY};

/// Capacity message sent to clients rejected at the admission gate
pub(crate) const REJECTION_BODY: &str = "Can't take more clients, try again later.";

/// Upper bound on the request head we are willing to buffer
const MAX_REQUEST_HEAD: usize = 8 * 1024;

/// Parsed request line (headers are read and discarded)
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Request {
    pub method: String,
    pub target: String,
}

/// Read one request head from the connection
pub(crate) async fn read_request<R: AsyncRead + Unpin>(reader: &mut R) -> io::Result<Request> {
    let mut buf = BytesMut::with_capacity(1024);
    loop {
        let n = reader.read_buf(&mut buf).await?;
        if head_complete(&buf) {
            return parse_request_line(&buf);
        }
        if n == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "connection closed before request head",
            ));
        }
        if buf.len() > MAX_REQUEST_HEAD {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "request head too large",
            ));
        }
    }
}

fn head_complete(buf: &[u8]) -> bool {
    buf.windows(4).any(|w| w == b"\r\n\r\n")
}

fn parse_request_line(buf: &[u8]) -> io::Result<Request> {
    let line_end = buf
        .windows(2)
        .position(|w| w == b"\r\n")
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "missing request line"))?;
    let line = std::str::from_utf8(&buf[..line_end])
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidData, "request line not UTF-8"))?;

    let mut parts = line.split_whitespace();
    match (parts.next(), parts.next(), parts.next()) {
        (Some(method), Some(target), Some(_version)) => Ok(Request {
            method: method.to_string(),
            target: target.to_string(),
        }),
        _ => Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "malformed request line",
        )),
    }
}

/// Write the response head that opens the multipart stream
pub(crate) async fn write_stream_header<T: ChunkSink>(sink: &mut T) -> io::Result<()> {
    let header = format!(
        "HTTP/1.1 200 OK\r\n\
         Content-Type: multipart/x-mixed-replace;boundary={}\r\n\
         Connection: close\r\n\r\n",
        PART_BOUNDARY
    );
    sink.write_chunk(header.as_bytes()).await
}

/// Write the plain-text capacity rejection and finish the response
pub(crate) async fn write_rejection<T: ChunkSink>(sink: &mut T) -> io::Result<()> {
    let response = format!(
        "HTTP/1.1 200 OK\r\n\
         Content-Type: text/plain\r\n\
         Content-Length: {}\r\n\
         Connection: close\r\n\r\n{}",
        REJECTION_BODY.len(),
        REJECTION_BODY
    );
    sink.write_chunk(response.as_bytes()).await
}

/// Write a plain-text 404 for anything that is not `GET /stream`
pub(crate) async fn write_not_found<T: ChunkSink>(sink: &mut T) -> io::Result<()> {
    let body = "Not Found";
    let response = format!(
        "HTTP/1.1 404 Not Found\r\n\
         Content-Type: text/plain\r\n\
         Content-Length: {}\r\n\
         Connection: close\r\n\r\n{}",
        body.len(),
        body
    );
    sink.write_chunk(response.as_bytes()).await
}
