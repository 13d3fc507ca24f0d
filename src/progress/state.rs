//! Per-orchestration progress state and emission snapshots
//!
//! Each orchestration owns exactly one [`ProgressState`]. All mutation goes
//! through methods that return an immutable [`ProgressUpdate`] snapshot, so
//! the value handed to the progress sink can never be changed by a later
//! stage.

use crate::progress::mapper::ProgressMapper;
use crate::progress::stage::Stage;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// One immutable progress event, ready for emission
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProgressUpdate {
    pub progress_id: String,
    pub status: Stage,
    pub percentage: i32,
    pub log: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_pages: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processed_pages: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chunks_stored: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code_examples_found: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_id: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// Mutable progress state owned by one orchestration
#[derive(Debug)]
pub struct ProgressState {
    progress_id: String,
    stage: Stage,
    mapper: ProgressMapper,
    percentage: i32,
    log: String,
    current_url: Option<String>,
    total_pages: Option<usize>,
    processed_pages: Option<usize>,
    chunks_stored: Option<usize>,
    code_examples_found: Option<usize>,
    source_id: Option<String>,
}

impl ProgressState {
    pub fn new(progress_id: impl Into<String>) -> Self {
        Self {
            progress_id: progress_id.into(),
            stage: Stage::Starting,
            mapper: ProgressMapper::new(),
            percentage: 0,
            log: String::new(),
            current_url: None,
            total_pages: None,
            processed_pages: None,
            chunks_stored: None,
            code_examples_found: None,
            source_id: None,
        }
    }

    /// Advances to `stage` at `stage_progress` (0-100) and snapshots
    ///
    /// The overall percentage is computed through the owned mapper, so it
    /// inherits the monotonic guarantee.
    pub fn advance(
        &mut self,
        stage: Stage,
        stage_progress: f64,
        log: impl Into<String>,
    ) -> ProgressUpdate {
        self.stage = stage;
        self.percentage = self.mapper.map(stage, stage_progress);
        self.log = log.into();
        self.snapshot()
    }

    pub fn set_current_url(&mut self, url: impl Into<String>) {
        self.current_url = Some(url.into());
    }

    pub fn set_page_counts(&mut self, processed: usize, total: usize) {
        self.processed_pages = Some(processed);
        self.total_pages = Some(total);
    }

    pub fn set_chunks_stored(&mut self, chunks: usize) {
        self.chunks_stored = Some(chunks);
    }

    pub fn set_code_examples_found(&mut self, count: usize) {
        self.code_examples_found = Some(count);
    }

    pub fn set_source_id(&mut self, source_id: impl Into<String>) {
        self.source_id = Some(source_id.into());
    }

    /// An immutable snapshot of the current state
    pub fn snapshot(&self) -> ProgressUpdate {
        ProgressUpdate {
            progress_id: self.progress_id.clone(),
            status: self.stage,
            percentage: self.percentage,
            log: self.log.clone(),
            current_url: self.current_url.clone(),
            total_pages: self.total_pages,
            processed_pages: self.processed_pages,
            chunks_stored: self.chunks_stored,
            code_examples_found: self.code_examples_found,
            source_id: self.source_id.clone(),
            timestamp: Utc::now(),
        }
    }

    pub fn progress_id(&self) -> &str {
        &self.progress_id
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn percentage(&self) -> i32 {
        self.percentage
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state_starts_at_zero() {
        let state = ProgressState::new("p-1");
        assert_eq!(state.stage(), Stage::Starting);
        assert_eq!(state.percentage(), 0);
    }

    #[test]
    fn test_advance_produces_snapshot() {
        let mut state = ProgressState::new("p-1");
        let update = state.advance(Stage::Crawling, 100.0, "crawl done");

        assert_eq!(update.progress_id, "p-1");
        assert_eq!(update.status, Stage::Crawling);
        assert_eq!(update.percentage, 30);
        assert_eq!(update.log, "crawl done");
    }

    #[test]
    fn test_snapshot_is_detached_from_later_mutation() {
        let mut state = ProgressState::new("p-1");
        let early = state.advance(Stage::Analyzing, 0.0, "analyzing");
        state.advance(Stage::Crawling, 100.0, "crawling");

        assert_eq!(early.status, Stage::Analyzing);
        assert_eq!(early.percentage, 0);
    }

    #[test]
    fn test_extra_fields_appear_in_snapshot() {
        let mut state = ProgressState::new("p-1");
        state.set_current_url("https://x.test/a");
        state.set_page_counts(2, 10);
        state.set_chunks_stored(7);
        let update = state.advance(Stage::DocumentStorage, 50.0, "storing");

        assert_eq!(update.current_url.as_deref(), Some("https://x.test/a"));
        assert_eq!(update.processed_pages, Some(2));
        assert_eq!(update.total_pages, Some(10));
        assert_eq!(update.chunks_stored, Some(7));
        assert_eq!(update.code_examples_found, None);
    }

    #[test]
    fn test_serialization_shape() {
        let mut state = ProgressState::new("p-1");
        state.set_page_counts(1, 2);
        let update = state.advance(Stage::Crawling, 50.0, "working");
        let value = serde_json::to_value(&update).unwrap();

        assert_eq!(value["progressId"], "p-1");
        assert_eq!(value["status"], "crawling");
        assert_eq!(value["percentage"], 18);
        assert_eq!(value["totalPages"], 2);
        // Unset optional fields are omitted entirely.
        assert!(value.get("chunksStored").is_none());
    }

    #[test]
    fn test_error_snapshot_keeps_sentinel() {
        let mut state = ProgressState::new("p-1");
        state.advance(Stage::Crawling, 80.0, "crawling");
        let update = state.advance(Stage::Error, 0.0, "boom");

        assert_eq!(update.percentage, -1);
        assert_eq!(update.status, Stage::Error);
    }
}
