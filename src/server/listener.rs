//! MJPEG server listener
//!
//! Binds the TCP listener, runs the broadcast scheduler, and turns accepted
//! `GET /stream` requests into registered sessions through the admission
//! gate. Everything here is glue around the frame-path core.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::net::{TcpListener, TcpStream};

use crate::camera::FrameSource;
use crate::error::Result;
use crate::registry::{AdmissionError, SessionHandle, SessionRegistry};
use crate::scheduler::BroadcastScheduler;
use crate::server::config::ServerConfig;
use crate::server::http;
use crate::session::StreamConsumer;
use crate::stats::StreamerStats;
use crate::transport::{ChunkSink, TcpChunkSink};

/// MJPEG streaming server
pub struct MjpegServer<S: FrameSource + 'static> {
    config: ServerConfig,
    registry: Arc<SessionRegistry>,
    scheduler: Arc<BroadcastScheduler<S>>,
    stats: Arc<StreamerStats>,
    next_session_id: AtomicU64,
}

impl<S: FrameSource + 'static> MjpegServer<S> {
    /// Create a server around a frame source
    pub fn new(config: ServerConfig, source: S) -> Self {
        let registry = Arc::new(SessionRegistry::new(config.max_sessions));
        let stats = Arc::new(StreamerStats::new());
        let scheduler = Arc::new(BroadcastScheduler::with_stats(
            source,
            Arc::clone(&registry),
            config.scheduler.clone(),
            Arc::clone(&stats),
        ));

        Self {
            config,
            registry,
            scheduler,
            stats,
            next_session_id: AtomicU64::new(1),
        }
    }

    /// Get a reference to the session registry
    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }

    /// Get a reference to the shared statistics
    pub fn stats(&self) -> &Arc<StreamerStats> {
        &self.stats
    }

    /// Get the bind address
    pub fn bind_addr(&self) -> SocketAddr {
        self.config.bind_addr
    }

    /// Run the server
    ///
    /// This method blocks until the server is shut down.
    pub async fn run(&self) -> Result<()> {
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        tracing::info!(addr = %self.config.bind_addr, "MJPEG server listening");

        let scheduler = Arc::clone(&self.scheduler);
        let scheduler_handle = tokio::spawn(async move { scheduler.run().await });

        let result = self.accept_loop(&listener).await;
        scheduler_handle.abort();
        result
    }

    /// Run the server with graceful shutdown
    pub async fn run_until<F>(&self, shutdown: F) -> Result<()>
    where
        F: std::future::Future<Output = ()>,
    {
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        tracing::info!(addr = %self.config.bind_addr, "MJPEG server listening");

        let scheduler = Arc::clone(&self.scheduler);
        let scheduler_handle = tokio::spawn(async move { scheduler.run().await });

        let result = tokio::select! {
            _ = shutdown => {
                tracing::info!("Shutdown signal received");
                Ok(())
            }
            result = self.accept_loop(&listener) => result,
        };

        scheduler_handle.abort();
        result
    }

    async fn accept_loop(&self, listener: &TcpListener) -> Result<()> {
        loop {
            match listener.accept().await {
                Ok((socket, peer_addr)) => {
                    self.handle_connection(socket, peer_addr);
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to accept connection");
                }
            }
        }
    }

    fn handle_connection(&self, socket: TcpStream, peer_addr: SocketAddr) {
        if self.config.tcp_nodelay {
            if let Err(e) = socket.set_nodelay(true) {
                tracing::debug!(error = %e, "Failed to set TCP_NODELAY");
            }
        }

        let session_id = self.next_session_id.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(
            session_id = session_id,
            peer = %peer_addr,
            "New connection"
        );

        let registry = Arc::clone(&self.registry);
        let stats = Arc::clone(&self.stats);
        let write_timeout = self.config.write_timeout;

        tokio::spawn(async move {
            serve_client(socket, session_id, registry, stats, write_timeout).await;
            tracing::debug!(session_id = session_id, "Connection closed");
        });
    }
}

/// Handle one accepted connection: parse the request, run the admission
/// gate, and on acceptance become the session's consumer task.
async fn serve_client(
    mut socket: TcpStream,
    session_id: u64,
    registry: Arc<SessionRegistry>,
    stats: Arc<StreamerStats>,
    write_timeout: Duration,
) {
    let request = match http::read_request(&mut socket).await {
        Ok(request) => request,
        Err(e) => {
            tracing::debug!(session_id = session_id, error = %e, "Bad request");
            return;
        }
    };

    // The connection handle is moved, never duplicated; the sink owns it
    // exclusively from here on.
    let mut sink = TcpChunkSink::new(socket, write_timeout);

    if request.method != "GET" || request.target != "/stream" {
        tracing::debug!(
            session_id = session_id,
            method = %request.method,
            target = %request.target,
            "Unknown route"
        );
        let _ = http::write_not_found(&mut sink).await;
        let _ = sink.shutdown().await;
        return;
    }

    let (handle, mailbox) = SessionHandle::create(session_id);
    match registry.admit(handle).await {
        Ok(()) => {
            stats.record_admitted();
            if let Err(e) = http::write_stream_header(&mut sink).await {
                // Leave the session in place; its first handshake will fail
                // the same way and the sweep reaps it.
                tracing::debug!(session_id = session_id, error = %e, "Header write failed");
            }
            StreamConsumer::new(session_id, mailbox, sink).run().await;
        }
        Err(e @ AdmissionError::AtCapacity { .. }) => {
            stats.record_rejected();
            tracing::warn!(session_id = session_id, "Session rejected: {}", e);
            let _ = http::write_rejection(&mut sink).await;
            let _ = sink.shutdown().await;
        }
    }
}
