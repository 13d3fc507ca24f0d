use serde::Deserialize;

/// Main configuration structure for Seine
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub progress: ProgressConfig,
    #[serde(default, rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Crawl behavior configuration
///
/// Snapshotted when an orchestration starts; mid-crawl reconfiguration is
/// out of scope.
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Maximum number of concurrent page fetches
    #[serde(rename = "max-concurrent-fetches")]
    pub max_concurrent_fetches: u32,

    /// Number of URLs fetched together by the batch strategy
    #[serde(rename = "batch-size")]
    pub batch_size: u32,

    /// Fetch attempts per page before recording a page-level failure
    #[serde(rename = "max-retries")]
    pub max_retries: u32,

    /// Minimum rendered content length for a page to count as crawled
    #[serde(rename = "min-content-length")]
    pub min_content_length: u32,

    /// System memory usage (percent) above which fetch admission pauses
    #[serde(rename = "memory-threshold-percent")]
    pub memory_threshold_percent: f32,

    /// How often the dispatcher re-checks memory usage (milliseconds)
    #[serde(rename = "memory-check-interval-ms")]
    pub memory_check_interval_ms: u64,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_fetches: 10,
            batch_size: 50,
            max_retries: 3,
            min_content_length: 50,
            memory_threshold_percent: 80.0,
            memory_check_interval_ms: 500,
        }
    }
}

/// Progress reporting configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ProgressConfig {
    /// Interval of the keep-alive heartbeat during long stages (seconds)
    #[serde(rename = "heartbeat-interval-secs")]
    pub heartbeat_interval_secs: u64,

    /// Updates arriving within this window of the previous one are dropped,
    /// terminal transitions excepted (milliseconds)
    #[serde(rename = "min-emit-interval-ms")]
    pub min_emit_interval_ms: u64,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            heartbeat_interval_secs: 30,
            min_emit_interval_ms: 100,
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: "Seine".to_string(),
            crawler_version: env!("CARGO_PKG_VERSION").to_string(),
            contact_url: "https://example.com/seine".to_string(),
            contact_email: "crawler@example.com".to_string(),
        }
    }
}

/// Output configuration for the reference markdown store
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Directory where crawled documents are written
    #[serde(rename = "document-dir")]
    pub document_dir: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            document_dir: "./seine-output".to_string(),
        }
    }
}
