//! Cancellation flag and the per-run orchestration handle

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;

/// How long forced cleanup waits for a run to stop cooperatively
pub const DEFAULT_CANCEL_GRACE: Duration = Duration::from_secs(2);

/// A cooperative cancellation flag
///
/// Cheap to clone; all clones observe the same flag. Cancellation is
/// idempotent and can only ever move from not-cancelled to cancelled.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Returns whether cancellation has been requested
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// One live orchestration run, as seen by the registry
///
/// Created when a crawl request is accepted, registered under its
/// progress-id, and removed on any terminal outcome. Holds the
/// cancellation flag external cancel requests flip, plus the spawned task
/// for bounded-wait forced cleanup.
#[derive(Debug)]
pub struct OrchestrationHandle {
    progress_id: String,
    cancel: CancellationFlag,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl OrchestrationHandle {
    pub fn new(progress_id: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            progress_id: progress_id.into(),
            cancel: CancellationFlag::new(),
            task: Mutex::new(None),
        })
    }

    pub fn progress_id(&self) -> &str {
        &self.progress_id
    }

    /// The flag checked at the orchestration's cancellation checkpoints
    pub fn cancellation_flag(&self) -> CancellationFlag {
        self.cancel.clone()
    }

    /// Sets the cooperative cancellation flag
    pub fn cancel(&self) {
        tracing::info!("cancellation requested for {}", self.progress_id);
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Attaches the spawned orchestration task for forced-abort support
    pub fn attach_task(&self, task: JoinHandle<()>) {
        *self.task.lock().unwrap() = Some(task);
    }

    /// Cancels and waits up to `grace` for the task to finish on its own
    ///
    /// Cooperative checkpoints normally wind the run down quickly; a fetch
    /// that refuses to return is aborted once the grace period runs out,
    /// so cleanup never hangs on a misbehaving backend.
    pub async fn cancel_and_wait(&self, grace: Duration) {
        self.cancel();

        let task = self.task.lock().unwrap().take();
        if let Some(mut task) = task {
            tokio::select! {
                _ = &mut task => {}
                _ = tokio::time::sleep(grace) => {
                    tracing::warn!(
                        "orchestration {} did not stop within {:?}, aborting task",
                        self.progress_id,
                        grace
                    );
                    task.abort();
                    let _ = task.await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_starts_clear() {
        let flag = CancellationFlag::new();
        assert!(!flag.is_cancelled());
    }

    #[test]
    fn test_flag_shared_across_clones() {
        let flag = CancellationFlag::new();
        let clone = flag.clone();

        flag.cancel();
        assert!(clone.is_cancelled());
    }

    #[test]
    fn test_cancel_idempotent() {
        let flag = CancellationFlag::new();
        flag.cancel();
        flag.cancel();
        assert!(flag.is_cancelled());
    }

    #[test]
    fn test_handle_cancel_sets_flag() {
        let handle = OrchestrationHandle::new("p-1");
        let flag = handle.cancellation_flag();

        assert!(!flag.is_cancelled());
        handle.cancel();
        assert!(flag.is_cancelled());
        assert!(handle.is_cancelled());
    }

    #[tokio::test]
    async fn test_cancel_and_wait_cooperative_finish() {
        let handle = OrchestrationHandle::new("p-1");
        let flag = handle.cancellation_flag();

        handle.attach_task(tokio::spawn(async move {
            while !flag.is_cancelled() {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        }));

        handle.cancel_and_wait(Duration::from_secs(2)).await;
        assert!(handle.is_cancelled());
    }

    #[tokio::test]
    async fn test_cancel_and_wait_aborts_hung_task() {
        let handle = OrchestrationHandle::new("p-1");

        handle.attach_task(tokio::spawn(async {
            // Ignores the flag entirely.
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }));

        handle.cancel_and_wait(Duration::from_millis(50)).await;
        assert!(handle.is_cancelled());
    }
}
