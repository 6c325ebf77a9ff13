//! HTTP server glue
//!
//! Bring-up around the frame-path core: TCP accept loop, minimal HTTP/1.1
//! request handling for `GET /stream`, and the admission gate that turns an
//! accepted request into a registered streaming session.

pub mod config;
pub(crate) mod http;
pub mod listener;

pub use config::ServerConfig;
pub use listener::MjpegServer;
