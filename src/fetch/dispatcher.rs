//! Fetch admission control: concurrency permits plus a memory gate
//!
//! Fan-out crawling of many large pages can exhaust memory faster than a
//! fixed concurrency cap alone prevents, so admission is gated twice: a
//! counting permit pool bounds simultaneous fetches, and a periodic check
//! of system memory usage pauses new admissions while usage sits above the
//! configured threshold.

use crate::ConfigError;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use sysinfo::System;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Admission controller shared by all fetches of one orchestrator
pub struct FetchDispatcher {
    permits: Arc<Semaphore>,
    max_concurrent: usize,
    memory_threshold_percent: f32,
    check_interval: Duration,
    system: Mutex<System>,
    last_reading: Mutex<Option<(Instant, f32)>>,
}

/// A held fetch slot; dropped when the fetch completes
pub struct FetchPermit {
    _permit: OwnedSemaphorePermit,
}

impl FetchDispatcher {
    /// Creates a dispatcher
    ///
    /// # Arguments
    ///
    /// * `max_concurrent` - Maximum simultaneous fetch permit holders
    /// * `memory_threshold_percent` - Usage above this pauses admission
    /// * `check_interval` - How often memory usage is re-read
    ///
    /// Invalid settings fail fast; nothing is retried at this layer.
    pub fn new(
        max_concurrent: u32,
        memory_threshold_percent: f32,
        check_interval: Duration,
    ) -> Result<Self, ConfigError> {
        if max_concurrent == 0 {
            return Err(ConfigError::Validation(
                "max_concurrent must be >= 1".to_string(),
            ));
        }
        if memory_threshold_percent <= 0.0 || memory_threshold_percent > 100.0 {
            return Err(ConfigError::Validation(format!(
                "memory_threshold_percent must be in (0, 100], got {}",
                memory_threshold_percent
            )));
        }

        Ok(Self {
            permits: Arc::new(Semaphore::new(max_concurrent as usize)),
            max_concurrent: max_concurrent as usize,
            memory_threshold_percent,
            check_interval,
            system: Mutex::new(System::new()),
            last_reading: Mutex::new(None),
        })
    }

    /// Waits for admission and returns the held permit
    ///
    /// Blocks first on the memory gate (re-checked every `check_interval`),
    /// then on the permit pool. Admission through the semaphore is atomic:
    /// there are never more than `max_concurrent` holders.
    pub async fn acquire(&self) -> FetchPermit {
        loop {
            let usage = self.memory_usage_percent();
            if usage < self.memory_threshold_percent {
                break;
            }
            tracing::warn!(
                "memory usage {:.1}% above threshold {:.1}%, pausing fetch admission",
                usage,
                self.memory_threshold_percent
            );
            tokio::time::sleep(self.check_interval).await;
        }

        let permit = self
            .permits
            .clone()
            .acquire_owned()
            .await
            .expect("dispatcher semaphore is never closed");

        FetchPermit { _permit: permit }
    }

    /// Permits currently free (for tests and stats)
    pub fn available_permits(&self) -> usize {
        self.permits.available_permits()
    }

    /// The configured concurrency bound
    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    /// Current system memory usage, cached for `check_interval`
    fn memory_usage_percent(&self) -> f32 {
        {
            let last = self.last_reading.lock().unwrap();
            if let Some((at, usage)) = *last {
                if at.elapsed() < self.check_interval {
                    return usage;
                }
            }
        }

        let mut system = self.system.lock().unwrap();
        system.refresh_memory();
        let total = system.total_memory();
        let usage = if total == 0 {
            0.0
        } else {
            (total.saturating_sub(system.available_memory())) as f32 / total as f32 * 100.0
        };

        *self.last_reading.lock().unwrap() = Some((Instant::now(), usage));
        usage
    }
}
