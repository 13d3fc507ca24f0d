//! Crawl orchestration: the top-level coordinator
//!
//! One orchestrator drives a crawl request through the stage machine
//! STARTING → ANALYZING → CRAWLING → PROCESSING → DOCUMENT_STORAGE →
//! CODE_EXTRACTION → FINALIZATION → COMPLETED, with ERROR and CANCELLED
//! reachable from any non-terminal state. It classifies the URL, selects a
//! strategy, relays collaborator progress through the monotonic mapper,
//! and observes the cancellation flag at well-defined checkpoints.

mod handle;
mod registry;

pub use handle::{CancellationFlag, OrchestrationHandle, DEFAULT_CANCEL_GRACE};
pub use registry::OrchestrationRegistry;

use crate::config::Config;
use crate::fetch::{build_http_client, FetchDispatcher};
use crate::pipeline::{CodeExtractor, DocumentStore, ProgressHook};
use crate::progress::{ProgressReporter, ProgressSink, Stage};
use crate::site::SiteProfile;
use crate::strategy::{
    crawl_recursive, crawl_single_page, crawl_sitemap, CrawlContext, CrawlHarvest,
};
use crate::url::{classify_url, transform_github_url, UrlKind};
use crate::{ConfigError, CrawlError};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use url::Url;
use uuid::Uuid;

/// One crawl request, immutable once submitted
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlRequest {
    pub url: String,
    pub knowledge_type: String,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    pub max_depth: u32,
    #[serde(default)]
    pub extract_code_examples: bool,
    #[serde(default)]
    pub generate_summary: bool,
}

impl CrawlRequest {
    /// Checks request invariants before a run is accepted
    ///
    /// Fails fast: an invalid request never registers an orchestration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        Url::parse(&self.url)
            .map_err(|e| ConfigError::InvalidUrl(format!("{}: {}", self.url, e)))?;

        if !(1..=5).contains(&self.max_depth) {
            return Err(ConfigError::Validation(format!(
                "max_depth must be between 1 and 5, got {}",
                self.max_depth
            )));
        }

        Ok(())
    }
}

/// Final counts reported with the completion event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlSummary {
    pub source_id: String,
    pub pages_crawled: usize,
    pub pages_total: usize,
    pub chunks_stored: usize,
    pub code_examples_found: usize,
}

/// Terminal result of one orchestration run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CrawlOutcome {
    Completed(CrawlSummary),
    Cancelled,
    Failed(String),
}

/// Internal stop reasons; cancellation is control flow, not an error
enum RunStop {
    Cancelled,
    Failed(CrawlError),
}

fn checkpoint(cancel: &CancellationFlag) -> Result<(), RunStop> {
    if cancel.is_cancelled() {
        Err(RunStop::Cancelled)
    } else {
        Ok(())
    }
}

/// The top-level crawl coordinator
///
/// Holds the shared HTTP client and fetch dispatcher; one orchestrator
/// serves many runs. The registry, progress sink, and collaborators are
/// injected so the engine stays independent of any concrete backend.
pub struct Orchestrator {
    config: Arc<Config>,
    client: Client,
    dispatcher: Arc<FetchDispatcher>,
    registry: Arc<OrchestrationRegistry>,
    sink: Arc<dyn ProgressSink>,
    store: Arc<dyn DocumentStore>,
    extractor: Arc<dyn CodeExtractor>,
}

impl Orchestrator {
    /// Builds an orchestrator, failing fast on invalid configuration
    ///
    /// A client that cannot be constructed means no fetch backend exists
    /// at all, which is fatal rather than retryable.
    pub fn new(
        config: Arc<Config>,
        registry: Arc<OrchestrationRegistry>,
        sink: Arc<dyn ProgressSink>,
        store: Arc<dyn DocumentStore>,
        extractor: Arc<dyn CodeExtractor>,
    ) -> Result<Self, CrawlError> {
        crate::config::validate(&config)?;

        let client = build_http_client(&config.user_agent)
            .map_err(|e| CrawlError::CrawlerUnavailable(e.to_string()))?;

        let dispatcher = Arc::new(FetchDispatcher::new(
            config.crawler.max_concurrent_fetches,
            config.crawler.memory_threshold_percent,
            Duration::from_millis(config.crawler.memory_check_interval_ms),
        )?);

        Ok(Self {
            config,
            client,
            dispatcher,
            registry,
            sink,
            store,
            extractor,
        })
    }

    pub fn registry(&self) -> Arc<OrchestrationRegistry> {
        self.registry.clone()
    }

    /// Accepts a request: validates, registers, and spawns the run
    ///
    /// Returns the registered handle; the run proceeds in the background
    /// and unregisters itself on any terminal outcome.
    pub fn spawn(self: &Arc<Self>, request: CrawlRequest) -> Result<Arc<OrchestrationHandle>, CrawlError> {
        request.validate()?;

        let progress_id = Uuid::new_v4().to_string();
        let handle = OrchestrationHandle::new(&progress_id);
        self.registry.register(handle.clone())?;

        let orchestrator = self.clone();
        let run_handle = handle.clone();
        let task = tokio::spawn(async move {
            orchestrator.run(request, run_handle).await;
        });
        handle.attach_task(task);

        Ok(handle)
    }

    /// Drives one registered run to a terminal outcome
    ///
    /// Every exit path emits exactly one terminal progress event and
    /// removes the handle from the registry; errors are converted into the
    /// terminal `error` event rather than propagating.
    pub async fn run(
        &self,
        request: CrawlRequest,
        handle: Arc<OrchestrationHandle>,
    ) -> CrawlOutcome {
        let progress_id = handle.progress_id().to_string();
        let reporter = Arc::new(ProgressReporter::new(
            &progress_id,
            self.sink.clone(),
            Duration::from_millis(self.config.progress.min_emit_interval_ms),
        ));

        reporter
            .report(Stage::Starting, 0.0, format!("starting crawl of {}", request.url))
            .await;

        let _heartbeat = HeartbeatGuard::spawn(
            reporter.clone(),
            Duration::from_secs(self.config.progress.heartbeat_interval_secs),
        );

        let cancel = handle.cancellation_flag();
        let result = self.execute(&request, &reporter, &cancel).await;

        let outcome = match result {
            Ok(summary) => {
                reporter
                    .report_with(
                        Stage::Completed,
                        100.0,
                        format!(
                            "crawl completed: {} pages, {} chunks, {} code examples",
                            summary.pages_crawled,
                            summary.chunks_stored,
                            summary.code_examples_found
                        ),
                        |state| {
                            state.set_source_id(&summary.source_id);
                            state.set_page_counts(summary.pages_crawled, summary.pages_total);
                            state.set_chunks_stored(summary.chunks_stored);
                            state.set_code_examples_found(summary.code_examples_found);
                        },
                    )
                    .await;
                CrawlOutcome::Completed(summary)
            }
            Err(RunStop::Cancelled) => {
                tracing::info!("crawl {} cancelled", progress_id);
                reporter
                    .report(Stage::Cancelled, 0.0, "crawl cancelled")
                    .await;
                CrawlOutcome::Cancelled
            }
            Err(RunStop::Failed(e)) => {
                tracing::error!("crawl {} failed: {}", progress_id, e);
                reporter.report(Stage::Error, 0.0, e.to_string()).await;
                CrawlOutcome::Failed(e.to_string())
            }
        };

        self.registry.unregister(&progress_id);
        outcome
    }

    async fn execute(
        &self,
        request: &CrawlRequest,
        reporter: &Arc<ProgressReporter>,
        cancel: &CancellationFlag,
    ) -> Result<CrawlSummary, RunStop> {
        // ANALYZING: pick the strategy.
        reporter
            .report(Stage::Analyzing, 0.0, "analyzing crawl source")
            .await;

        let url = transform_github_url(&request.url);
        let kind = classify_url(&url);
        let profile =
            SiteProfile::for_url(&url, self.config.crawler.min_content_length as usize);

        tracing::info!(
            "selected {} strategy for {} (documentation site: {})",
            kind.as_str(),
            url,
            profile.is_documentation
        );
        reporter
            .report_with(
                Stage::Analyzing,
                100.0,
                format!("selected {} strategy", kind.as_str()),
                |state| state.set_current_url(&url),
            )
            .await;

        let ctx = CrawlContext {
            client: self.client.clone(),
            dispatcher: self.dispatcher.clone(),
            crawler: self.config.crawler.clone(),
            render: profile.render.clone(),
            reporter: reporter.clone(),
            cancel: cancel.clone(),
        };

        // CRAWLING, with checkpoints on both sides.
        checkpoint(cancel)?;
        reporter
            .report(Stage::Crawling, 0.0, format!("crawling {}", url))
            .await;

        let harvest = match kind {
            UrlKind::TextFile => match crawl_single_page(&ctx, &url).await {
                Ok(page) => CrawlHarvest {
                    pages: vec![page],
                    failures: Vec::new(),
                },
                Err(failure) => {
                    tracing::warn!(
                        "single page crawl of {} failed after {} attempts: {}",
                        failure.url,
                        failure.attempts,
                        failure.last_error
                    );
                    CrawlHarvest {
                        pages: Vec::new(),
                        failures: vec![failure],
                    }
                }
            },
            UrlKind::Sitemap => crawl_sitemap(&ctx, &url).await.map_err(RunStop::Failed)?,
            UrlKind::Page => crawl_recursive(&ctx, &url, request.max_depth).await,
        };

        checkpoint(cancel)?;

        let pages_total = harvest.pages.len() + harvest.failures.len();
        if harvest.pages.is_empty() {
            return Err(RunStop::Failed(CrawlError::NoContent));
        }

        // PROCESSING: hand-off point to the storage collaborator.
        reporter
            .report_with(
                Stage::Processing,
                100.0,
                format!("processing {} crawled pages", harvest.pages.len()),
                |state| state.set_page_counts(harvest.pages.len(), pages_total),
            )
            .await;

        // DOCUMENT_STORAGE: relay the collaborator's progress callbacks.
        let source_id = Uuid::new_v4().to_string();
        reporter
            .report(Stage::DocumentStorage, 0.0, "storing documents")
            .await;

        let (hook, relay) = stage_relay(reporter.clone(), Stage::DocumentStorage);
        let store_result = self
            .store
            .store_documents(&harvest.pages, request, &source_id, hook)
            .await;
        let _ = relay.await;
        let store_outcome = store_result.map_err(|e| RunStop::Failed(e.into()))?;

        reporter
            .report_with(
                Stage::DocumentStorage,
                100.0,
                format!("stored {} chunks", store_outcome.chunk_count),
                |state| state.set_chunks_stored(store_outcome.chunk_count),
            )
            .await;
        checkpoint(cancel)?;

        // CODE_EXTRACTION, only when requested.
        let mut code_examples_found = 0;
        if request.extract_code_examples {
            reporter
                .report(Stage::CodeExtraction, 0.0, "extracting code examples")
                .await;

            let (hook, relay) = stage_relay(reporter.clone(), Stage::CodeExtraction);
            let extract_result = self
                .extractor
                .extract(&harvest.pages, &store_outcome.url_to_full_text, hook)
                .await;
            let _ = relay.await;
            code_examples_found = extract_result.map_err(|e| RunStop::Failed(e.into()))?;

            reporter
                .report_with(
                    Stage::CodeExtraction,
                    100.0,
                    format!("found {} code examples", code_examples_found),
                    |state| state.set_code_examples_found(code_examples_found),
                )
                .await;
            checkpoint(cancel)?;
        }

        // FINALIZATION.
        checkpoint(cancel)?;
        reporter
            .report_with(Stage::Finalization, 100.0, "finalizing crawl", |state| {
                state.set_source_id(&source_id)
            })
            .await;

        Ok(CrawlSummary {
            source_id,
            pages_crawled: harvest.pages.len(),
            pages_total,
            chunks_stored: store_outcome.chunk_count,
            code_examples_found,
        })
    }
}

/// Bridges a collaborator's sync progress hook into the async reporter
///
/// Updates are forwarded over a channel and re-emitted in generation
/// order. Dropping the hook (when the collaborator returns) closes the
/// channel; awaiting the relay flushes whatever is still queued.
fn stage_relay(
    reporter: Arc<ProgressReporter>,
    stage: Stage,
) -> (ProgressHook, JoinHandle<()>) {
    let (tx, mut rx) = mpsc::unbounded_channel::<(f64, String)>();

    let relay = tokio::spawn(async move {
        while let Some((percent, message)) = rx.recv().await {
            reporter.report(stage, percent, message).await;
        }
    });

    let hook: ProgressHook = Arc::new(move |percent, message: &str| {
        let _ = tx.send((percent, message.to_string()));
    });

    (hook, relay)
}

/// Aborts the heartbeat task when the run reaches a terminal state
struct HeartbeatGuard {
    task: JoinHandle<()>,
}

impl HeartbeatGuard {
    fn spawn(reporter: Arc<ProgressReporter>, interval: Duration) -> Self {
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // The first tick completes immediately; skip it.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                reporter.heartbeat().await;
            }
        });
        Self { task }
    }
}

impl Drop for HeartbeatGuard {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_request(url: &str) -> CrawlRequest {
        CrawlRequest {
            url: url.to_string(),
            knowledge_type: "technical".to_string(),
            tags: BTreeSet::new(),
            max_depth: 2,
            extract_code_examples: false,
            generate_summary: false,
        }
    }

    #[test]
    fn test_request_validation_accepts_depth_range() {
        for depth in 1..=5 {
            let mut request = create_test_request("https://x.test/");
            request.max_depth = depth;
            assert!(request.validate().is_ok(), "depth {} should be valid", depth);
        }
    }

    #[test]
    fn test_request_validation_rejects_bad_depth() {
        let mut request = create_test_request("https://x.test/");
        request.max_depth = 0;
        assert!(request.validate().is_err());

        request.max_depth = 6;
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_request_validation_rejects_bad_url() {
        let request = create_test_request("not a url");
        assert!(matches!(
            request.validate(),
            Err(ConfigError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_request_deserializes_with_defaults() {
        let request: CrawlRequest = serde_json::from_str(
            r#"{"url": "https://x.test/", "knowledge_type": "technical", "max_depth": 2}"#,
        )
        .unwrap();

        assert!(request.tags.is_empty());
        assert!(!request.extract_code_examples);
        assert!(!request.generate_summary);
    }
}
