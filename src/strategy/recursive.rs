//! Recursive strategy: breadth-first link following
//!
//! Crawls depth levels one at a time: fetch the current frontier as a
//! batch, then build the next frontier from the internal links of the
//! pages that succeeded. The visited set is keyed on fragment-stripped
//! normalized URLs and entries are inserted when a URL joins the frontier,
//! which guarantees no URL is fetched twice across the whole run.

use crate::strategy::{crawl_batch, CrawlContext, CrawlHarvest, ProgressWindow};
use crate::url::{is_binary_file_url, normalize_url};
use std::collections::HashSet;

/// Crawls breadth-first from `start_url` up to `max_depth` levels
///
/// Depth 1 is the seed page itself. Binary-file links and already-visited
/// URLs never enter the frontier; an empty frontier terminates the crawl
/// early. Each depth reports progress into its own slice of the crawling
/// stage.
pub async fn crawl_recursive(
    ctx: &CrawlContext,
    start_url: &str,
    max_depth: u32,
) -> CrawlHarvest {
    let max_depth = max_depth.max(1);
    let mut harvest = CrawlHarvest::default();

    let mut visited: HashSet<String> = HashSet::new();
    visited.insert(visited_key(start_url));
    let mut frontier = vec![start_url.to_string()];

    for depth in 1..=max_depth {
        if frontier.is_empty() {
            tracing::info!("frontier empty before depth {}, stopping early", depth);
            break;
        }
        if ctx.cancel.is_cancelled() {
            tracing::info!("cancellation observed before depth {}", depth);
            break;
        }

        tracing::info!(
            "crawling depth {}/{}: {} urls in frontier",
            depth,
            max_depth,
            frontier.len()
        );

        let window = ProgressWindow::FULL.slice(
            (depth - 1) as f64 / max_depth as f64,
            depth as f64 / max_depth as f64,
        );
        let level = crawl_batch(ctx, &frontier, window).await;

        frontier = next_frontier(&level, &mut visited);

        harvest.pages.extend(level.pages);
        harvest.failures.extend(level.failures);
    }

    tracing::info!(
        "recursive crawl finished: {} pages, {} failures, {} urls seen",
        harvest.pages.len(),
        harvest.failures.len(),
        visited.len()
    );
    harvest
}

/// Collects the next depth's frontier from this depth's successful pages
fn next_frontier(level: &CrawlHarvest, visited: &mut HashSet<String>) -> Vec<String> {
    let mut next = Vec::new();

    for page in &level.pages {
        for link in &page.internal_links {
            if is_binary_file_url(link) {
                continue;
            }
            let key = match normalize_url(link) {
                Ok(k) => k,
                Err(_) => continue,
            };
            if visited.insert(key) {
                next.push(link.clone());
            }
        }
    }

    next
}

/// Visited-set key; unparseable URLs fall back to the raw string
fn visited_key(url: &str) -> String {
    normalize_url(url).unwrap_or_else(|_| url.to_string())
}
