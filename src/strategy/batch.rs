//! Batch strategy: fixed-size concurrent batches under the dispatcher
//!
//! Splits the URL list into batches, fans each batch out through the fetch
//! dispatcher, and streams per-page progress as completions arrive. A
//! failed page is logged and excluded from the results; the batch call
//! never aborts for individual page failures.

use crate::fetch::fetch_page;
use crate::progress::Stage;
use crate::strategy::{CrawlContext, CrawlHarvest, PageFailure, ProgressWindow};
use tokio::task::JoinSet;

/// Crawls `urls` in batches, reporting progress into `window`
///
/// Progress is `processed/total` projected into the caller-supplied
/// sub-range of the crawling stage, so callers composing multiple batch
/// runs (the recursive strategy, one per depth) keep the externally
/// visible progress moving forward.
pub async fn crawl_batch(
    ctx: &CrawlContext,
    urls: &[String],
    window: ProgressWindow,
) -> CrawlHarvest {
    let total = urls.len();
    let mut harvest = CrawlHarvest::default();
    if total == 0 {
        return harvest;
    }

    let batch_size = ctx.crawler.batch_size.max(1) as usize;
    let mut processed = 0usize;

    for chunk in urls.chunks(batch_size) {
        if ctx.cancel.is_cancelled() {
            tracing::info!("cancellation observed, stopping batch crawl");
            break;
        }

        let mut tasks = JoinSet::new();
        for url in chunk {
            let client = ctx.client.clone();
            let dispatcher = ctx.dispatcher.clone();
            let render = ctx.render.clone();
            let url = url.clone();
            tasks.spawn(async move {
                let _permit = dispatcher.acquire().await;
                let result = fetch_page(&client, &url, &render).await;
                (url, result)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            let (url, result) = match joined {
                Ok(pair) => pair,
                Err(e) => {
                    tracing::error!("fetch task failed to join: {}", e);
                    continue;
                }
            };

            processed += 1;
            let fraction = processed as f64 / total as f64;

            match result {
                Ok(page) => {
                    ctx.reporter
                        .report_with(
                            Stage::Crawling,
                            window.project(fraction),
                            format!("crawled {}/{} pages", processed, total),
                            |state| {
                                state.set_current_url(&url);
                                state.set_page_counts(processed, total);
                            },
                        )
                        .await;
                    harvest.pages.push(page);
                }
                Err(e) => {
                    tracing::warn!("page {} failed, excluding from batch: {}", url, e);
                    harvest.failures.push(PageFailure {
                        url,
                        attempts: 1,
                        last_error: e.to_string(),
                    });
                }
            }
        }
    }

    tracing::info!(
        "batch crawl finished: {} ok, {} failed of {} urls",
        harvest.pages.len(),
        harvest.failures.len(),
        total
    );
    harvest
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CrawlerConfig;
    use crate::fetch::{build_http_client, FetchDispatcher};
    use crate::orchestrator::CancellationFlag;
    use crate::progress::{ChannelProgressSink, ProgressReporter};
    use crate::site::RenderOptions;
    use std::sync::Arc;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const LONG_BODY: &str = "<html><body><p>This body is comfortably longer than the \
        fifty character validation minimum for pages.</p></body></html>";

    fn create_test_context(
        batch_size: u32,
    ) -> (
        CrawlContext,
        tokio::sync::mpsc::UnboundedReceiver<crate::progress::ProgressUpdate>,
    ) {
        let (sink, rx) = ChannelProgressSink::new();
        let ctx = CrawlContext {
            client: build_http_client(&crate::config::UserAgentConfig::default()).unwrap(),
            dispatcher: Arc::new(
                FetchDispatcher::new(4, 100.0, Duration::from_millis(100)).unwrap(),
            ),
            crawler: CrawlerConfig {
                batch_size,
                ..CrawlerConfig::default()
            },
            render: RenderOptions::default(),
            reporter: Arc::new(ProgressReporter::new(
                "p-test",
                Arc::new(sink),
                Duration::ZERO,
            )),
            cancel: CancellationFlag::new(),
        };
        (ctx, rx)
    }

    #[tokio::test]
    async fn test_batch_fetches_all_urls() {
        let server = MockServer::start().await;
        for p in ["/a", "/b", "/c"] {
            Mock::given(method("GET"))
                .and(path(p))
                .respond_with(ResponseTemplate::new(200).set_body_string(LONG_BODY))
                .mount(&server)
                .await;
        }

        let (ctx, _rx) = create_test_context(2);
        let urls: Vec<String> = ["/a", "/b", "/c"]
            .iter()
            .map(|p| format!("{}{}", server.uri(), p))
            .collect();

        let harvest = crawl_batch(&ctx, &urls, ProgressWindow::FULL).await;

        assert_eq!(harvest.pages.len(), 3);
        assert!(harvest.failures.is_empty());
    }

    #[tokio::test]
    async fn test_failures_excluded_not_fatal() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ok"))
            .respond_with(ResponseTemplate::new(200).set_body_string(LONG_BODY))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/broken"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let (ctx, _rx) = create_test_context(10);
        let urls = vec![
            format!("{}/ok", server.uri()),
            format!("{}/broken", server.uri()),
        ];

        let harvest = crawl_batch(&ctx, &urls, ProgressWindow::FULL).await;

        assert_eq!(harvest.pages.len(), 1);
        assert_eq!(harvest.failures.len(), 1);
        assert!(harvest.failures[0].last_error.contains("500"));
    }

    #[tokio::test]
    async fn test_progress_reported_within_window() {
        let server = MockServer::start().await;
        for p in ["/a", "/b"] {
            Mock::given(method("GET"))
                .and(path(p))
                .respond_with(ResponseTemplate::new(200).set_body_string(LONG_BODY))
                .mount(&server)
                .await;
        }

        let (ctx, mut rx) = create_test_context(10);
        let urls = vec![
            format!("{}/a", server.uri()),
            format!("{}/b", server.uri()),
        ];

        crawl_batch(&ctx, &urls, ProgressWindow { start: 50.0, end: 100.0 }).await;
        drop(ctx);

        let mut updates = Vec::new();
        while let Ok(update) = rx.try_recv() {
            updates.push(update);
        }

        // Two completions inside a 50..100 window of the 5..30 crawling
        // stage: 75% -> 24 overall, 100% -> 30 overall.
        assert_eq!(updates.len(), 2);
        assert_eq!(updates[0].processed_pages, Some(1));
        assert_eq!(updates[1].processed_pages, Some(2));
        assert_eq!(updates[1].percentage, 30);
        assert!(updates[0].percentage >= 24);
    }

    #[tokio::test]
    async fn test_cancellation_stops_later_batches() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(LONG_BODY))
            .expect(0)
            .mount(&server)
            .await;

        let (ctx, _rx) = create_test_context(1);
        ctx.cancel.cancel();
        let urls = vec![format!("{}/a", server.uri())];

        let harvest = crawl_batch(&ctx, &urls, ProgressWindow::FULL).await;
        assert!(harvest.pages.is_empty());
        assert!(harvest.failures.is_empty());
    }

    #[tokio::test]
    async fn test_empty_url_list() {
        let (ctx, _rx) = create_test_context(10);
        let harvest = crawl_batch(&ctx, &[], ProgressWindow::FULL).await;
        assert!(harvest.is_empty());
    }
}
