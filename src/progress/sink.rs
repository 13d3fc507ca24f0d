//! Progress sink trait, implementations, and the per-run reporter
//!
//! The sink is the boundary to the external progress broadcaster. It must
//! tolerate high-frequency calls, and a sink failure must never abort a
//! crawl: the reporter logs the failure and keeps going.

use crate::progress::stage::Stage;
use crate::progress::state::{ProgressState, ProgressUpdate};
use async_trait::async_trait;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::mpsc;

/// Errors a progress sink may report
///
/// These are logged and swallowed by the reporter; they never propagate.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("progress channel closed")]
    Closed,

    #[error("{0}")]
    Other(String),
}

/// Consumer side of the progress stream
#[async_trait]
pub trait ProgressSink: Send + Sync {
    /// Delivers one progress update
    ///
    /// Must be safe to call at high frequency. Implementations may drop
    /// near-duplicate low-information updates, but must never drop
    /// `starting`, `error`, `completed`, or `cancelled` transitions.
    async fn emit(&self, update: &ProgressUpdate) -> Result<(), SinkError>;
}

/// A sink that discards all updates
///
/// Used as the default when no observer is attached.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopProgressSink;

#[async_trait]
impl ProgressSink for NoopProgressSink {
    async fn emit(&self, _update: &ProgressUpdate) -> Result<(), SinkError> {
        Ok(())
    }
}

/// A sink that logs updates through tracing
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingProgressSink;

#[async_trait]
impl ProgressSink for LoggingProgressSink {
    async fn emit(&self, update: &ProgressUpdate) -> Result<(), SinkError> {
        tracing::info!(
            progress_id = %update.progress_id,
            status = %update.status,
            percentage = update.percentage,
            "{}",
            update.log
        );
        Ok(())
    }
}

/// A sink that forwards updates into an mpsc channel
///
/// The integration tests drain the receiver to assert on event sequences.
#[derive(Debug, Clone)]
pub struct ChannelProgressSink {
    tx: mpsc::UnboundedSender<ProgressUpdate>,
}

impl ChannelProgressSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ProgressUpdate>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

#[async_trait]
impl ProgressSink for ChannelProgressSink {
    async fn emit(&self, update: &ProgressUpdate) -> Result<(), SinkError> {
        self.tx.send(update.clone()).map_err(|_| SinkError::Closed)
    }
}

/// Owns one orchestration's progress state and drives the sink
///
/// All progress reporting for a run flows through one reporter, which
/// guarantees generation-order delivery and applies the suppression window
/// for near-duplicate updates. Terminal transitions and `starting` always
/// pass through.
pub struct ProgressReporter {
    state: Mutex<ProgressState>,
    sink: Arc<dyn ProgressSink>,
    last_emit: Mutex<Option<Instant>>,
    min_interval: Duration,
}

impl ProgressReporter {
    pub fn new(
        progress_id: impl Into<String>,
        sink: Arc<dyn ProgressSink>,
        min_interval: Duration,
    ) -> Self {
        Self {
            state: Mutex::new(ProgressState::new(progress_id)),
            sink,
            last_emit: Mutex::new(None),
            min_interval,
        }
    }

    /// Advances the state and emits the snapshot (subject to suppression)
    pub async fn report(&self, stage: Stage, stage_progress: f64, log: impl Into<String>) {
        self.report_with(stage, stage_progress, log, |_| {}).await;
    }

    /// Like [`report`](Self::report), with access to the extra fields
    ///
    /// The closure runs under the state lock, before the snapshot is taken.
    pub async fn report_with<F>(
        &self,
        stage: Stage,
        stage_progress: f64,
        log: impl Into<String>,
        configure: F,
    ) where
        F: FnOnce(&mut ProgressState),
    {
        let update = {
            let mut state = self.state.lock().unwrap();
            configure(&mut state);
            state.advance(stage, stage_progress, log)
        };

        if self.suppressed(&update) {
            return;
        }
        self.emit(update).await;
    }

    /// Re-emits the latest snapshot, bypassing the suppression window
    ///
    /// The orchestrator's heartbeat task calls this so the external channel
    /// does not appear stalled during long stages. No-op once terminal.
    pub async fn heartbeat(&self) {
        let update = self.state.lock().unwrap().snapshot();
        if update.status.is_terminal() {
            return;
        }
        self.emit(update).await;
    }

    /// The latest snapshot without emitting it
    pub fn snapshot(&self) -> ProgressUpdate {
        self.state.lock().unwrap().snapshot()
    }

    pub fn progress_id(&self) -> String {
        self.state.lock().unwrap().progress_id().to_string()
    }

    fn suppressed(&self, update: &ProgressUpdate) -> bool {
        if matches!(
            update.status,
            Stage::Starting | Stage::Error | Stage::Completed | Stage::Cancelled
        ) {
            return false;
        }

        let last = self.last_emit.lock().unwrap();
        matches!(*last, Some(at) if at.elapsed() < self.min_interval)
    }

    async fn emit(&self, update: ProgressUpdate) {
        match self.sink.emit(&update).await {
            Ok(()) => {
                *self.last_emit.lock().unwrap() = Some(Instant::now());
            }
            Err(e) => {
                // A broken observer must never take the crawl down with it.
                tracing::warn!(
                    progress_id = %update.progress_id,
                    "progress sink failure: {}",
                    e
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_reporter(
        min_interval: Duration,
    ) -> (ProgressReporter, mpsc::UnboundedReceiver<ProgressUpdate>) {
        let (sink, rx) = ChannelProgressSink::new();
        let reporter = ProgressReporter::new("p-test", Arc::new(sink), min_interval);
        (reporter, rx)
    }

    #[tokio::test]
    async fn test_updates_flow_to_sink() {
        let (reporter, mut rx) = create_test_reporter(Duration::ZERO);

        reporter.report(Stage::Starting, 0.0, "starting").await;
        reporter.report(Stage::Crawling, 100.0, "crawled").await;

        let first = rx.recv().await.unwrap();
        assert_eq!(first.status, Stage::Starting);
        let second = rx.recv().await.unwrap();
        assert_eq!(second.status, Stage::Crawling);
        assert_eq!(second.percentage, 30);
    }

    #[tokio::test]
    async fn test_rapid_updates_suppressed() {
        let (reporter, mut rx) = create_test_reporter(Duration::from_secs(60));

        reporter.report(Stage::Crawling, 10.0, "a").await;
        reporter.report(Stage::Crawling, 20.0, "b").await;
        reporter.report(Stage::Crawling, 30.0, "c").await;

        // Only the first crawling update lands inside the window.
        let first = rx.recv().await.unwrap();
        assert_eq!(first.log, "a");
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_terminal_updates_never_suppressed() {
        let (reporter, mut rx) = create_test_reporter(Duration::from_secs(60));

        reporter.report(Stage::Crawling, 10.0, "a").await;
        reporter.report(Stage::Completed, 100.0, "done").await;

        let first = rx.recv().await.unwrap();
        assert_eq!(first.status, Stage::Crawling);
        let last = rx.recv().await.unwrap();
        assert_eq!(last.status, Stage::Completed);
        assert_eq!(last.percentage, 100);
    }

    #[tokio::test]
    async fn test_heartbeat_bypasses_window() {
        let (reporter, mut rx) = create_test_reporter(Duration::from_secs(60));

        reporter.report(Stage::Crawling, 10.0, "a").await;
        reporter.heartbeat().await;

        let _ = rx.recv().await.unwrap();
        let beat = rx.recv().await.unwrap();
        assert_eq!(beat.status, Stage::Crawling);
        assert_eq!(beat.log, "a");
    }

    #[tokio::test]
    async fn test_heartbeat_stops_after_terminal() {
        let (reporter, mut rx) = create_test_reporter(Duration::ZERO);

        reporter.report(Stage::Cancelled, 0.0, "cancelled").await;
        reporter.heartbeat().await;

        let terminal = rx.recv().await.unwrap();
        assert_eq!(terminal.status, Stage::Cancelled);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_sink_failure_does_not_panic() {
        struct FailingSink;

        #[async_trait]
        impl ProgressSink for FailingSink {
            async fn emit(&self, _update: &ProgressUpdate) -> Result<(), SinkError> {
                Err(SinkError::Other("observer went away".to_string()))
            }
        }

        let reporter =
            ProgressReporter::new("p-test", Arc::new(FailingSink), Duration::ZERO);
        reporter.report(Stage::Crawling, 50.0, "still fine").await;
        assert_eq!(reporter.snapshot().status, Stage::Crawling);
    }
}
