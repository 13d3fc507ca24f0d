//! Collaborator trait interfaces
//!
//! The orchestrator hands crawl results to two external collaborators: the
//! document storage pipeline and the code-example extractor. Both are
//! consumed as traits so the engine never depends on a concrete backend;
//! the reference implementations in this crate exist for the CLI and the
//! integration tests.

use crate::fetch::PageResult;
use crate::orchestrator::CrawlRequest;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

/// Progress callback for collaborator work: `(percent 0-100, message)`
///
/// Relayed by the orchestrator through the progress mapper into the
/// collaborator's stage range.
pub type ProgressHook = Arc<dyn Fn(f64, &str) + Send + Sync>;

/// Errors from the storage pipeline
///
/// Surface as a terminal `error` event; chunks already written stay
/// written (no partial rollback).
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage backend failure: {0}")]
    Backend(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors from the code-example extractor
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("extraction failed: {0}")]
    Failed(String),
}

/// What the storage pipeline reports back after storing a crawl
#[derive(Debug, Default)]
pub struct StoreOutcome {
    /// Number of content chunks written
    pub chunk_count: usize,

    /// Full stored text per URL, for the code extractor
    pub url_to_full_text: HashMap<String, String>,
}

/// The document storage pipeline boundary
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Stores the crawled pages under `source_id`
    ///
    /// Implementations report progress through `on_progress` as often as
    /// they like; the hook is cheap and never fails.
    async fn store_documents(
        &self,
        pages: &[PageResult],
        request: &CrawlRequest,
        source_id: &str,
        on_progress: ProgressHook,
    ) -> Result<StoreOutcome, StoreError>;
}

/// The code-example extraction boundary
#[async_trait]
pub trait CodeExtractor: Send + Sync {
    /// Extracts code examples, returning how many were found
    async fn extract(
        &self,
        pages: &[PageResult],
        url_to_full_text: &HashMap<String, String>,
        on_progress: ProgressHook,
    ) -> Result<usize, ExtractError>;
}
