//! HTTP client construction and single-fetch execution
//!
//! One reqwest client is built per orchestrator and shared by every
//! strategy. Fetch failures are classified into the retryable/permanent
//! taxonomy consumed by the single-page strategy's retry loop.

use crate::config::UserAgentConfig;
use crate::fetch::page::{render_page, PageResult};
use crate::site::RenderOptions;
use crate::url::is_text_file_url;
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Per-page fetch failure
///
/// Carried inside page-level failure records; never aborts a whole crawl.
#[derive(Debug, Error)]
pub enum PageError {
    #[error("HTTP status {status}")]
    Status { status: u16 },

    #[error("request timed out")]
    Timeout,

    #[error("network error: {0}")]
    Network(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("content validation failed: {0}")]
    ContentValidation(String),
}

impl PageError {
    /// Whether the single-page strategy should retry after this error
    ///
    /// Client errors other than 429 are permanent; server errors,
    /// timeouts, transport failures, and partially-rendered content are
    /// worth another attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Status { status } => *status == 429 || *status >= 500,
            Self::Timeout | Self::Network(_) | Self::ContentValidation(_) => true,
            Self::InvalidUrl(_) => false,
        }
    }
}

/// Builds the shared HTTP client
///
/// User agent format: `CrawlerName/Version (+ContactURL; ContactEmail)`.
pub fn build_http_client(config: &UserAgentConfig) -> Result<Client, reqwest::Error> {
    let user_agent = format!(
        "{}/{} (+{}; {})",
        config.crawler_name, config.crawler_version, config.contact_url, config.contact_email
    );

    Client::builder()
        .user_agent(user_agent)
        .timeout(Duration::from_secs(30))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches a URL and returns the raw body
///
/// Used for sitemap XML and anywhere rendering is not wanted.
pub async fn fetch_body(client: &Client, url: &str) -> Result<String, PageError> {
    let response = client.get(url).send().await.map_err(classify_error)?;

    let status = response.status();
    if !status.is_success() {
        return Err(PageError::Status {
            status: status.as_u16(),
        });
    }

    response.text().await.map_err(classify_error)
}

/// Fetches a URL and renders it into a [`PageResult`]
///
/// Text-file URLs skip HTML rendering; the body is the markdown. HTML pages
/// are validated after rendering: the detected framework's content root
/// must have been present and the markdown must reach the configured
/// minimum length, otherwise the fetch fails with `ContentValidation` so
/// the retry loop can take another pass at a partially-rendered page.
pub async fn fetch_page(
    client: &Client,
    url: &str,
    render: &RenderOptions,
) -> Result<PageResult, PageError> {
    let parsed = Url::parse(url).map_err(|e| PageError::InvalidUrl(e.to_string()))?;

    let body = fetch_body(client, url).await?;

    if is_text_file_url(url) {
        let page = PageResult::from_text(url, body);
        if page.markdown.trim().is_empty() {
            return Err(PageError::ContentValidation(
                "text file is empty".to_string(),
            ));
        }
        return Ok(page);
    }

    let rendered = render_page(&parsed, &body);

    if !rendered.content_root_found {
        return Err(PageError::ContentValidation(format!(
            "content root '{}' not present ({} page)",
            rendered.framework.content_selector(),
            rendered.framework.as_str()
        )));
    }

    if rendered.page.markdown.len() < render.min_content_length {
        return Err(PageError::ContentValidation(format!(
            "rendered content below minimum length ({} < {} chars)",
            rendered.page.markdown.len(),
            render.min_content_length
        )));
    }

    Ok(rendered.page)
}

fn classify_error(error: reqwest::Error) -> PageError {
    if error.is_timeout() {
        PageError::Timeout
    } else if error.is_connect() {
        PageError::Network("connection failed".to_string())
    } else {
        PageError::Network(error.to_string())
    }
}
