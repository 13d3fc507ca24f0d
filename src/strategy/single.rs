//! Single-page strategy: retry with exponential backoff
//!
//! Used for text files and as the building block wherever exactly one URL
//! must be fetched reliably. Content validation failures (empty or
//! below-minimum pages, missing content roots) retry the same way network
//! failures do, since both usually mean the origin served a half-rendered
//! response.

use crate::fetch::fetch_page;
use crate::progress::Stage;
use crate::strategy::{CrawlContext, PageFailure};
use crate::fetch::PageResult;
use std::time::Duration;

/// Fetches one page, retrying up to the configured attempt count
///
/// Backoff doubles per attempt (`2^attempt` seconds). Exhausting all
/// attempts returns a structured [`PageFailure`] carrying the last error
/// message; permanent errors (404 and friends) short-circuit the loop.
pub async fn crawl_single_page(
    ctx: &CrawlContext,
    url: &str,
) -> Result<PageResult, PageFailure> {
    let max_retries = ctx.crawler.max_retries.max(1);
    let mut last_error = String::new();
    let mut attempts = 0;

    for attempt in 0..max_retries {
        if attempt > 0 {
            let backoff = Duration::from_secs(2u64.saturating_pow(attempt));
            tracing::debug!(
                "retrying {} in {:?} (attempt {}/{})",
                url,
                backoff,
                attempt + 1,
                max_retries
            );
            tokio::time::sleep(backoff).await;
        }

        if ctx.cancel.is_cancelled() {
            last_error = "crawl cancelled".to_string();
            break;
        }

        attempts += 1;
        ctx.reporter
            .report_with(
                Stage::Crawling,
                0.0,
                format!("fetching {} (attempt {}/{})", url, attempt + 1, max_retries),
                |state| state.set_current_url(url),
            )
            .await;

        let permit = ctx.dispatcher.acquire().await;
        let result = fetch_page(&ctx.client, url, &ctx.render).await;
        drop(permit);

        match result {
            Ok(page) => {
                tracing::info!("crawled {} on attempt {}", url, attempt + 1);
                return Ok(page);
            }
            Err(e) => {
                tracing::warn!("fetch of {} failed: {}", url, e);
                last_error = e.to_string();
                if !e.is_retryable() {
                    break;
                }
            }
        }
    }

    Err(PageFailure {
        url: url.to_string(),
        attempts,
        last_error,
    })
}
