//! Connectivity supervisor
//!
//! Peripheral to the frame path: when the link layer reports a disconnect,
//! one supervisor task retries connection establishment with a fixed backoff
//! until it succeeds or a link-up notification from elsewhere cancels it.
//! It never touches the session registry.

use std::io;
use std::time::Duration;

use tokio::sync::watch;

/// Link layer state as published by the platform glue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Up,
    Down,
}

/// Link bring-up seam
///
/// One `connect` call is one reconnection attempt; errors are retryable by
/// definition, fatal bring-up failures belong to process bootstrap.
pub trait LinkConnector: Send + Sync {
    fn connect(&self) -> impl std::future::Future<Output = io::Result<()>> + Send;
}

/// Retries link establishment after a disconnect
///
/// Spawned per link-down event; terminates on success or when the link
/// comes back up on its own.
pub struct ConnectivitySupervisor<C: LinkConnector> {
    connector: C,
    backoff: Duration,
}

impl<C: LinkConnector> ConnectivitySupervisor<C> {
    /// Create a supervisor with a fixed retry backoff
    pub fn new(connector: C, backoff: Duration) -> Self {
        Self { connector, backoff }
    }

    /// Retry until connected or until `link` reports `Up`
    pub async fn run(self, mut link: watch::Receiver<LinkState>) {
        tracing::warn!("Link down, starting reconnect loop");

        let retry = async {
            loop {
                match self.connector.connect().await {
                    Ok(()) => {
                        tracing::info!("Link re-established");
                        return;
                    }
                    Err(e) => {
                        tracing::debug!(
                            error = %e,
                            backoff_ms = self.backoff.as_millis() as u64,
                            "Reconnect attempt failed"
                        );
                        tokio::time::sleep(self.backoff).await;
                    }
                }
            }
        };

        tokio::select! {
            _ = retry => {}
            _ = wait_link_up(&mut link) => {
                tracing::info!("Link restored externally, stopping retries");
            }
        }
    }
}

/// Resolve once the watch reports `Up` (or its sender is gone)
async fn wait_link_up(link: &mut watch::Receiver<LinkState>) {
    loop {
        if *link.borrow_and_update() == LinkState::Up {
            return;
        }
        if link.changed().await.is_err() {
            return;
        }
    }
}
