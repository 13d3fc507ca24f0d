//! Crawl strategies
//!
//! Four strategies consume URLs under the fetch dispatcher and produce
//! page results, reporting stage-relative progress as they go:
//!
//! - `single`: one page, with retry/backoff and content validation
//! - `batch`: N urls in fixed-size concurrent batches
//! - `recursive`: breadth-first link following up to a depth limit
//! - `sitemap`: expand an XML sitemap, then batch-fetch it

mod batch;
mod recursive;
mod single;
mod sitemap;

pub use batch::crawl_batch;
pub use recursive::crawl_recursive;
pub use single::crawl_single_page;
pub use sitemap::{crawl_sitemap, parse_sitemap_urls};

use crate::config::CrawlerConfig;
use crate::fetch::{FetchDispatcher, PageResult};
use crate::orchestrator::CancellationFlag;
use crate::progress::ProgressReporter;
use crate::site::RenderOptions;
use reqwest::Client;
use std::sync::Arc;

/// Everything a strategy needs for one orchestration run
///
/// Cheap to clone into fetch tasks: the client and dispatcher are shared
/// handles, the configs are plain data.
#[derive(Clone)]
pub struct CrawlContext {
    pub client: Client,
    pub dispatcher: Arc<FetchDispatcher>,
    pub crawler: CrawlerConfig,
    pub render: RenderOptions,
    pub reporter: Arc<ProgressReporter>,
    pub cancel: CancellationFlag,
}

/// A page that could not be crawled, with the last error observed
///
/// Structured data, not an exception: page failures never abort a crawl.
#[derive(Debug, Clone)]
pub struct PageFailure {
    pub url: String,
    pub attempts: u32,
    pub last_error: String,
}

/// Combined output of a strategy run
#[derive(Debug, Default)]
pub struct CrawlHarvest {
    pub pages: Vec<PageResult>,
    pub failures: Vec<PageFailure>,
}

impl CrawlHarvest {
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

/// A sub-range of a stage's 0-100 progress scale
///
/// Batch reports `processed/total` projected into the caller's window, so
/// the recursive strategy can hand each depth its own slice and keep the
/// stage progress moving forward across depths.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressWindow {
    pub start: f64,
    pub end: f64,
}

impl ProgressWindow {
    /// The whole stage, 0 to 100
    pub const FULL: ProgressWindow = ProgressWindow {
        start: 0.0,
        end: 100.0,
    };

    /// Projects a 0..1 fraction into this window
    pub fn project(&self, fraction: f64) -> f64 {
        self.start + (self.end - self.start) * fraction.clamp(0.0, 1.0)
    }

    /// A sub-window between two 0..1 fractions of this window
    pub fn slice(&self, lo: f64, hi: f64) -> ProgressWindow {
        ProgressWindow {
            start: self.project(lo),
            end: self.project(hi),
        }
    }
}
