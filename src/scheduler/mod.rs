//! Broadcast scheduler
//!
//! The single frame producer. Each cycle walks a fixed state sequence:
//!
//! ```text
//!        ┌────────► Idle (registry empty: park, no polling)
//!        │             │ admission wake
//!        │             ▼
//!        │         CaptureFrame ── miss/empty ──┐
//!        │             │                        │
//!        │             ▼                        │
//!        │         BroadcastSweep               │
//!        │       (lock held, one handshake      │
//!        │        per session, dead reaped)     │
//!        │             │                        │
//!        │             ▼                        ▼
//!        └───────── Throttle ◄──────────────────┘
//! ```
//!
//! Exactly one frame is in flight per cycle; it is released back to the
//! driver only after every session has acknowledged or been abandoned. When
//! no client is connected the driver is never touched at all, which is what
//! keeps an otherwise idle device cold.

use std::sync::Arc;

use crate::camera::FrameSource;
use crate::registry::SessionRegistry;
use crate::stats::StreamerStats;

pub mod config;

pub use config::SchedulerConfig;

/// The frame producer: captures, sweeps, throttles, idles
///
/// Constructed once at startup and handed its collaborators explicitly;
/// there is no global instance.
pub struct BroadcastScheduler<S: FrameSource> {
    source: S,
    registry: Arc<SessionRegistry>,
    config: SchedulerConfig,
    stats: Arc<StreamerStats>,
}

impl<S: FrameSource> BroadcastScheduler<S> {
    /// Create a scheduler with fresh stats
    pub fn new(source: S, registry: Arc<SessionRegistry>, config: SchedulerConfig) -> Self {
        Self::with_stats(source, registry, config, Arc::new(StreamerStats::new()))
    }

    /// Create a scheduler sharing an existing stats instance
    pub fn with_stats(
        source: S,
        registry: Arc<SessionRegistry>,
        config: SchedulerConfig,
        stats: Arc<StreamerStats>,
    ) -> Self {
        Self {
            source,
            registry,
            config,
            stats,
        }
    }

    /// Shared stats handle
    pub fn stats(&self) -> &Arc<StreamerStats> {
        &self.stats
    }

    /// Run capture cycles forever
    pub async fn run(&self) {
        loop {
            self.cycle().await;
        }
    }

    /// Run until the shutdown future resolves
    pub async fn run_until<F>(&self, shutdown: F)
    where
        F: std::future::Future<Output = ()>,
    {
        tokio::select! {
            _ = shutdown => {
                tracing::info!("Scheduler shutdown signal received");
            }
            _ = self.run() => {}
        }
    }

    /// One full cycle: idle-wait, capture, sweep, release, throttle
    async fn cycle(&self) {
        // Idle: park until the admission gate wakes us. The capture driver
        // is not touched while the registry is empty.
        self.registry.wait_for_sessions().await;

        let Some(frame) = self.source.acquire().await else {
            // Transient driver miss: skip this cycle, never escalate
            self.stats.record_capture_miss();
            tracing::trace!("Capture miss, skipping cycle");
            tokio::time::sleep(self.config.throttle).await;
            return;
        };

        self.stats.record_capture();

        if frame.is_empty() {
            // A zero-length frame is never broadcast
            tracing::trace!(seq = frame.seq(), "Empty frame, skipping cycle");
            self.source.release(frame).await;
            tokio::time::sleep(self.config.throttle).await;
            return;
        }

        let seq = frame.seq();
        let outcome = self
            .registry
            .broadcast_sweep(frame.payload(), self.config.handshake_timeout)
            .await;

        // Every consumer has acked or been abandoned; the frame can go back
        self.source.release(frame).await;

        self.stats.record_sweep(outcome.delivered, outcome.reaped);
        tracing::trace!(
            seq = seq,
            delivered = outcome.delivered,
            reaped = outcome.reaped,
            "Sweep complete"
        );
        if outcome.now_empty {
            tracing::debug!("Last session gone, scheduler idling");
        }

        tokio::time::sleep(self.config.throttle).await;
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::io;
    use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
    use std::sync::Mutex as StdMutex;
    use std::time::Duration;

    use bytes::Bytes;

    use super::*;
    use crate::camera::{Frame, FrameSource};
    use crate::registry::SessionHandle;
    use crate::session::StreamConsumer;
    use crate::transport::ChunkSink;

    /// Driver double: yields scripted payloads, then repeats the last one
    struct MockSource {
        script: StdMutex<VecDeque<Option<Bytes>>>,
        repeat: Option<Bytes>,
        acquired: AtomicU64,
        released: AtomicU64,
        seq: AtomicU64,
    }

    impl MockSource {
        fn scripted(script: Vec<Option<Bytes>>, repeat: Option<Bytes>) -> Self {
            Self {
                script: StdMutex::new(script.into()),
                repeat,
                acquired: AtomicU64::new(0),
                released: AtomicU64::new(0),
                seq: AtomicU64::new(0),
            }
        }

        fn repeating(payload: &'static [u8]) -> Self {
            Self::scripted(Vec::new(), Some(Bytes::from_static(payload)))
        }

        fn acquired(&self) -> u64 {
            self.acquired.load(Ordering::SeqCst)
        }

        fn released(&self) -> u64 {
            self.released.load(Ordering::SeqCst)
        }
    }

    impl FrameSource for &MockSource {
        async fn acquire(&self) -> Option<Frame> {
            self.acquired.fetch_add(1, Ordering::SeqCst);
            let next = self
                .script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| self.repeat.clone());
            next.map(|data| Frame::new(data, self.seq.fetch_add(1, Ordering::SeqCst)))
        }

        async fn release(&self, _frame: Frame) {
            self.released.fetch_add(1, Ordering::SeqCst);
        }
    }

    /// Sink recording complete parts, optionally failing from part N on
    #[derive(Clone)]
    struct PartSink {
        parts: Arc<StdMutex<Vec<Vec<u8>>>>,
        writes: Arc<AtomicUsize>,
        fail_from_write: usize,
    }

    impl PartSink {
        fn new(fail_from_write: usize) -> Self {
            Self {
                parts: Arc::new(StdMutex::new(Vec::new())),
                writes: Arc::new(AtomicUsize::new(0)),
                fail_from_write,
            }
        }
    }

    impl ChunkSink for PartSink {
        async fn write_chunk(&mut self, chunk: &[u8]) -> io::Result<()> {
            let n = self.writes.fetch_add(1, Ordering::SeqCst);
            if n >= self.fail_from_write {
                return Err(io::Error::new(io::ErrorKind::BrokenPipe, "peer gone"));
            }
            self.parts.lock().unwrap().push(chunk.to_vec());
            Ok(())
        }

        async fn shutdown(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn test_config() -> SchedulerConfig {
        SchedulerConfig::default()
            .throttle(Duration::from_millis(1))
            .handshake_timeout(Duration::from_secs(1))
    }

    fn admit_consumer(registry: &Arc<SessionRegistry>, id: u64, sink: PartSink) {
        let (handle, mailbox) = SessionHandle::create(id);
        tokio::spawn(StreamConsumer::new(id, mailbox, sink).run());
        let registry = Arc::clone(registry);
        tokio::spawn(async move {
            registry.admit(handle).await.unwrap();
        });
    }

    #[tokio::test]
    async fn test_idle_scheduler_never_touches_the_driver() {
        let source: &'static MockSource = Box::leak(Box::new(MockSource::repeating(b"jpeg")));
        let registry = Arc::new(SessionRegistry::new(5));
        let scheduler = Arc::new(BroadcastScheduler::new(
            source,
            Arc::clone(&registry),
            test_config(),
        ));

        let task = {
            let scheduler = Arc::clone(&scheduler);
            tokio::spawn(async move { scheduler.run().await })
        };

        tokio::time::sleep(Duration::from_millis(50)).await;
        task.abort();

        // Zero clients connected: acquire was never called
        assert_eq!(source.acquired(), 0);
    }

    #[tokio::test]
    async fn test_admission_resumes_idle_scheduler() {
        let source: &'static MockSource = Box::leak(Box::new(MockSource::repeating(b"jpeg")));
        let registry = Arc::new(SessionRegistry::new(5));
        let scheduler = Arc::new(BroadcastScheduler::new(
            source,
            Arc::clone(&registry),
            test_config(),
        ));

        let task = {
            let scheduler = Arc::clone(&scheduler);
            tokio::spawn(async move { scheduler.run().await })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(source.acquired(), 0);

        let sink = PartSink::new(usize::MAX);
        let parts = Arc::clone(&sink.parts);
        admit_consumer(&registry, 1, sink);

        // The scheduler resumes and frames start flowing promptly
        tokio::time::sleep(Duration::from_millis(100)).await;
        task.abort();

        assert!(source.acquired() > 0);
        assert!(!parts.lock().unwrap().is_empty());
        // Every acquired frame went back to the driver
        assert_eq!(source.acquired(), source.released());
    }

    #[tokio::test]
    async fn test_write_failure_on_second_frame_idles_scheduler() {
        let source: &'static MockSource = Box::leak(Box::new(MockSource::repeating(b"jpeg")));
        let registry = Arc::new(SessionRegistry::new(5));
        let scheduler = Arc::new(BroadcastScheduler::new(
            source,
            Arc::clone(&registry),
            test_config(),
        ));

        // First frame takes writes 0..3; write 3 (second frame) fails
        let sink = PartSink::new(3);
        admit_consumer(&registry, 1, sink);

        let task = {
            let scheduler = Arc::clone(&scheduler);
            tokio::spawn(async move { scheduler.run().await })
        };

        // Wait until the failing session has been reaped
        tokio::time::timeout(Duration::from_secs(2), async {
            while !registry.is_empty().await {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("dead session should be reaped");

        // Registry went 1 -> 0: the scheduler must idle, not keep capturing
        tokio::time::sleep(Duration::from_millis(20)).await;
        let settled = source.acquired();
        tokio::time::sleep(Duration::from_millis(50)).await;
        task.abort();

        assert_eq!(source.acquired(), settled);
        assert_eq!(source.acquired(), source.released());
    }

    #[tokio::test]
    async fn test_zero_length_frame_is_never_broadcast() {
        // One empty frame, then real ones
        let source: &'static MockSource = Box::leak(Box::new(MockSource::scripted(
            vec![Some(Bytes::new())],
            Some(Bytes::from_static(b"\xFF\xD8jpeg\xFF\xD9")),
        )));
        let registry = Arc::new(SessionRegistry::new(5));
        let scheduler = Arc::new(BroadcastScheduler::new(
            source,
            Arc::clone(&registry),
            test_config(),
        ));

        let sink = PartSink::new(usize::MAX);
        let parts = Arc::clone(&sink.parts);
        admit_consumer(&registry, 1, sink);

        let task = {
            let scheduler = Arc::clone(&scheduler);
            tokio::spawn(async move { scheduler.run().await })
        };
        tokio::time::sleep(Duration::from_millis(100)).await;
        task.abort();

        // The empty frame was acquired and released but produced no part
        assert!(source.acquired() >= 2);
        let parts = parts.lock().unwrap();
        assert!(!parts.is_empty());
        for chunk in parts.iter() {
            assert!(!chunk.is_empty(), "no empty part body may be emitted");
        }
        // Part payload chunks carry the real frame only
        assert!(parts.iter().any(|c| c == b"\xFF\xD8jpeg\xFF\xD9"));
    }

    #[tokio::test]
    async fn test_capture_miss_skips_cycle_and_recovers() {
        // Two misses, then frames
        let source: &'static MockSource = Box::leak(Box::new(MockSource::scripted(
            vec![None, None],
            Some(Bytes::from_static(b"jpeg")),
        )));
        let registry = Arc::new(SessionRegistry::new(5));
        let scheduler = Arc::new(BroadcastScheduler::new(
            source,
            Arc::clone(&registry),
            test_config(),
        ));

        let sink = PartSink::new(usize::MAX);
        let parts = Arc::clone(&sink.parts);
        admit_consumer(&registry, 1, sink);

        let task = {
            let scheduler = Arc::clone(&scheduler);
            tokio::spawn(async move { scheduler.run().await })
        };
        tokio::time::sleep(Duration::from_millis(100)).await;
        task.abort();

        assert_eq!(scheduler.stats().capture_misses(), 2);
        assert!(!parts.lock().unwrap().is_empty());
        // Misses release nothing; every real frame went back
        assert_eq!(source.acquired() - 2, source.released());
    }

    #[tokio::test]
    async fn test_run_until_stops_on_shutdown() {
        let source: &'static MockSource = Box::leak(Box::new(MockSource::repeating(b"jpeg")));
        let registry = Arc::new(SessionRegistry::new(5));
        let scheduler = BroadcastScheduler::new(source, registry, test_config());

        tokio::time::timeout(
            Duration::from_secs(1),
            scheduler.run_until(tokio::time::sleep(Duration::from_millis(10))),
        )
        .await
        .expect("run_until should return once shutdown resolves");
    }
}
