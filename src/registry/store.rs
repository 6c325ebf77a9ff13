//! Session registry implementation
//!
//! The central store of active sessions. One `tokio::sync::Mutex` guards the
//! ordered session list; it is held briefly for admission and for the whole
//! iteration during a broadcast sweep, which keeps removal trivially
//! consistent with iteration.

use std::time::Duration;

use bytes::Bytes;
use tokio::sync::{Mutex, Notify};

use super::entry::{HandshakeOutcome, SessionHandle};
use super::error::AdmissionError;

/// Result of one broadcast sweep over all registered sessions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SweepOutcome {
    /// Sessions that acknowledged the frame
    pub delivered: usize,
    /// Sessions removed during this sweep
    pub reaped: usize,
    /// Whether the registry was empty when the sweep finished
    pub now_empty: bool,
}

/// Registry of active streaming sessions with a fixed admission cap
///
/// Also carries the scheduler's wake handle: the admission of the first
/// session stores a wake permit, so a scheduler that checks emptiness and
/// then parks cannot miss the notification.
pub struct SessionRegistry {
    sessions: Mutex<Vec<SessionHandle>>,
    capacity: usize,
    wake: Notify,
}

impl SessionRegistry {
    /// Create a registry that admits at most `capacity` concurrent sessions
    pub fn new(capacity: usize) -> Self {
        Self {
            sessions: Mutex::new(Vec::with_capacity(capacity)),
            capacity,
            wake: Notify::new(),
        }
    }

    /// The configured session cap
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of active sessions
    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    /// Whether no session is registered
    pub async fn is_empty(&self) -> bool {
        self.sessions.lock().await.is_empty()
    }

    /// IDs of the registered sessions, in sweep order
    pub async fn session_ids(&self) -> Vec<u64> {
        self.sessions.lock().await.iter().map(|s| s.id()).collect()
    }

    /// Admit a new session, or reject it at capacity
    ///
    /// The capacity check and the insert happen under one lock acquisition.
    /// If this admission is the 0 → 1 transition, the scheduler is woken
    /// after the lock is released.
    pub async fn admit(&self, handle: SessionHandle) -> Result<(), AdmissionError> {
        let session_id = handle.id();
        let was_empty;
        let active;
        {
            let mut sessions = self.sessions.lock().await;
            if sessions.len() >= self.capacity {
                return Err(AdmissionError::AtCapacity {
                    capacity: self.capacity,
                });
            }
            was_empty = sessions.is_empty();
            sessions.push(handle);
            active = sessions.len();
        }

        tracing::info!(
            session_id = session_id,
            sessions = active,
            capacity = self.capacity,
            "Session admitted"
        );

        if was_empty {
            self.wake.notify_one();
            tracing::debug!("First session admitted, waking scheduler");
        }

        Ok(())
    }

    /// Block until at least one session is registered
    ///
    /// This is the scheduler's Idle state: no polling, no timeout. `Notify`
    /// stores a permit from `admit`, so an admission that lands between the
    /// emptiness check and the park resumes immediately.
    pub async fn wait_for_sessions(&self) {
        loop {
            if !self.is_empty().await {
                return;
            }
            self.wake.notified().await;
        }
    }

    /// Offer one frame payload to every session in registry order
    ///
    /// The lock is held for the entire sweep. Each session is offered the
    /// frame and awaited synchronously; dead sessions are removed in place
    /// with an index cursor, so no live neighbor is skipped or visited
    /// twice. A reaped session is never offered to again.
    pub(crate) async fn broadcast_sweep(
        &self,
        payload: Bytes,
        handshake_timeout: Duration,
    ) -> SweepOutcome {
        let mut sessions = self.sessions.lock().await;
        let mut delivered = 0;
        let mut reaped = 0;
        let mut idx = 0;

        while idx < sessions.len() {
            match sessions[idx].offer(payload.clone(), handshake_timeout).await {
                HandshakeOutcome::Delivered => {
                    delivered += 1;
                    idx += 1;
                }
                HandshakeOutcome::Dead => {
                    let handle = sessions.remove(idx);
                    reaped += 1;
                    tracing::info!(
                        session_id = handle.id(),
                        sessions = sessions.len(),
                        "Session reaped"
                    );
                }
            }
        }

        SweepOutcome {
            delivered,
            reaped,
            now_empty: sessions.is_empty(),
        }
    }
}
