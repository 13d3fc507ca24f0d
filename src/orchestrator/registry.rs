//! Process-wide registry of in-flight orchestrations
//!
//! Cancel requests arrive on a different execution context than the run
//! they target, so the registry is the mutex-guarded meeting point: the
//! request-accepting layer registers a handle per progress-id, external
//! control calls look it up, and the orchestrator removes it on any terminal
//! outcome. The registry is owned by the process and injected, never a
//! module-level global.

use crate::orchestrator::handle::OrchestrationHandle;
use crate::CrawlError;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Map from progress-id to the live orchestration handle
#[derive(Debug, Default)]
pub struct OrchestrationRegistry {
    inner: Mutex<HashMap<String, Arc<OrchestrationHandle>>>,
}

impl OrchestrationRegistry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Registers a handle under its progress-id
    ///
    /// At most one live handle may exist per progress-id; a duplicate
    /// registration is rejected so two runs can never share a progress
    /// channel.
    pub fn register(&self, handle: Arc<OrchestrationHandle>) -> Result<(), CrawlError> {
        let mut inner = self.inner.lock().unwrap();
        let progress_id = handle.progress_id().to_string();

        if inner.contains_key(&progress_id) {
            return Err(CrawlError::DuplicateRun(progress_id));
        }

        inner.insert(progress_id, handle);
        Ok(())
    }

    /// Removes and returns the handle for `progress_id`
    pub fn unregister(&self, progress_id: &str) -> Option<Arc<OrchestrationHandle>> {
        self.inner.lock().unwrap().remove(progress_id)
    }

    /// Looks up the handle for `progress_id`
    pub fn get(&self, progress_id: &str) -> Option<Arc<OrchestrationHandle>> {
        self.inner.lock().unwrap().get(progress_id).cloned()
    }

    /// Sets the cancellation flag for `progress_id`
    ///
    /// Returns false if no such run is registered (already finished, or
    /// never existed).
    pub fn cancel(&self, progress_id: &str) -> bool {
        match self.get(progress_id) {
            Some(handle) => {
                handle.cancel();
                true
            }
            None => {
                tracing::debug!("cancel requested for unknown progress id {}", progress_id);
                false
            }
        }
    }

    /// Cancels `progress_id` and waits (bounded) for its task to stop
    ///
    /// Cooperative checkpoints normally wind the run down well inside the
    /// grace period; a run stuck in a misbehaving fetch is aborted when it
    /// expires, so cleanup never hangs.
    pub async fn cancel_and_wait(&self, progress_id: &str, grace: std::time::Duration) -> bool {
        match self.get(progress_id) {
            Some(handle) => {
                handle.cancel_and_wait(grace).await;
                true
            }
            None => false,
        }
    }

    /// Whether the run for `progress_id` has been cancelled
    ///
    /// Unregistered ids report false.
    pub fn is_cancelled(&self, progress_id: &str) -> bool {
        self.get(progress_id)
            .map(|handle| handle.is_cancelled())
            .unwrap_or(false)
    }

    pub fn contains(&self, progress_id: &str) -> bool {
        self.inner.lock().unwrap().contains_key(progress_id)
    }

    pub fn active_count(&self) -> usize {
        self.inner.lock().unwrap().len()
    }
}
