//! Seine: a crawl orchestration engine
//!
//! This crate ingests web sources (single pages, text files, XML sitemaps,
//! and whole sites via link-following) and turns them into stored content
//! plus extracted code snippets, reporting live progress to an external
//! observer and supporting mid-flight cancellation.

pub mod config;
pub mod fetch;
pub mod orchestrator;
pub mod pipeline;
pub mod progress;
pub mod site;
pub mod strategy;
pub mod url;

use thiserror::Error;

/// Main error type for Seine operations
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("no working fetch backend: {0}")]
    CrawlerUnavailable(String),

    #[error("no content was crawled from the provided URL")]
    NoContent,

    #[error("an orchestration is already registered for progress id {0}")]
    DuplicateRun(String),

    #[error("Storage error: {0}")]
    Storage(#[from] pipeline::StoreError),

    #[error("Code extraction error: {0}")]
    Extraction(#[from] pipeline::ExtractError),

    #[error("Fetch error for {url}: {message}")]
    Fetch { url: String, message: String },

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,

    #[error("Malformed URL: {0}")]
    Malformed(String),
}

/// Result type alias for Seine operations
pub type Result<T> = std::result::Result<T, CrawlError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use fetch::{FetchDispatcher, PageResult};
pub use orchestrator::{
    CrawlOutcome, CrawlRequest, OrchestrationHandle, OrchestrationRegistry, Orchestrator,
};
pub use progress::{ProgressMapper, ProgressSink, ProgressUpdate, Stage};
pub use self::url::{classify_url, normalize_url, transform_github_url, UrlKind};
