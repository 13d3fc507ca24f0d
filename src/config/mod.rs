//! Configuration module for Seine
//!
//! This module handles loading, parsing, and validating TOML configuration
//! files. Every setting has a default, so an empty file (or no file at all)
//! yields a runnable configuration.
//!
//! # Example
//!
//! ```no_run
//! use seine::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("config.toml")).unwrap();
//! println!("Fetch concurrency: {}", config.crawler.max_concurrent_fetches);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, CrawlerConfig, OutputConfig, ProgressConfig, UserAgentConfig};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash};

// Re-export validation for request-level checks
pub use validation::validate;
