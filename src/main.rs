//! Seine main entry point
//!
//! This is the command-line interface for the Seine crawl orchestration
//! engine: it accepts one crawl request, runs it with the logging progress
//! sink and the markdown-directory store, and cancels cooperatively on
//! Ctrl-C.

use clap::Parser;
use seine::config::{load_config_with_hash, Config};
use seine::orchestrator::{
    CrawlOutcome, CrawlRequest, OrchestrationHandle, OrchestrationRegistry, Orchestrator,
};
use seine::pipeline::{FencedCodeExtractor, MarkdownDirStore};
use seine::progress::LoggingProgressSink;
use seine::url::classify_url;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

/// Seine: a crawl orchestration engine
///
/// Seine ingests a web source (single page, text file, XML sitemap, or a
/// whole site via link-following) and turns it into stored markdown
/// documents plus extracted code examples, with live progress reporting.
#[derive(Parser, Debug)]
#[command(name = "seine")]
#[command(version)]
#[command(about = "A crawl orchestration engine", long_about = None)]
struct Cli {
    /// URL to crawl
    #[arg(value_name = "URL")]
    url: String,

    /// Path to TOML configuration file (defaults apply without one)
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Knowledge type recorded with stored documents
    #[arg(long, default_value = "technical")]
    knowledge_type: String,

    /// Tag attached to stored documents (repeatable)
    #[arg(long = "tag", value_name = "TAG")]
    tags: Vec<String>,

    /// Maximum link-following depth (1-5)
    #[arg(long, default_value_t = 2)]
    max_depth: u32,

    /// Extract code examples after document storage
    #[arg(long)]
    extract_code_examples: bool,

    /// Generate a summary index alongside stored documents
    #[arg(long)]
    summary: bool,

    /// Directory for stored documents (overrides the config file)
    #[arg(long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Classify the URL and print the chosen strategy without crawling
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let config = match &cli.config {
        Some(path) => {
            let (config, hash) = load_config_with_hash(path)?;
            tracing::info!("configuration loaded from {} (hash: {})", path.display(), hash);
            config
        }
        None => Config::default(),
    };

    let request = CrawlRequest {
        url: cli.url.clone(),
        knowledge_type: cli.knowledge_type.clone(),
        tags: cli.tags.iter().cloned().collect(),
        max_depth: cli.max_depth,
        extract_code_examples: cli.extract_code_examples,
        generate_summary: cli.summary,
    };
    request.validate()?;

    if cli.dry_run {
        println!(
            "{} -> {} strategy (max depth {})",
            cli.url,
            classify_url(&cli.url).as_str(),
            cli.max_depth
        );
        return Ok(());
    }

    let output_dir = cli
        .output_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from(&config.output.document_dir));

    let registry = OrchestrationRegistry::new();
    let orchestrator = Arc::new(Orchestrator::new(
        Arc::new(config),
        registry.clone(),
        Arc::new(LoggingProgressSink),
        Arc::new(MarkdownDirStore::new(&output_dir)),
        Arc::new(FencedCodeExtractor::default()),
    )?);

    let progress_id = Uuid::new_v4().to_string();
    let handle = OrchestrationHandle::new(&progress_id);
    registry.register(handle.clone())?;

    // Ctrl-C flips the cooperative cancellation flag; the run winds down
    // at its next checkpoint.
    {
        let registry = registry.clone();
        let progress_id = progress_id.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("interrupt received, cancelling crawl");
                registry.cancel(&progress_id);
            }
        });
    }

    match orchestrator.run(request, handle).await {
        CrawlOutcome::Completed(summary) => {
            println!(
                "crawl completed: {} pages crawled, {} chunks stored, {} code examples (source {})",
                summary.pages_crawled,
                summary.chunks_stored,
                summary.code_examples_found,
                summary.source_id
            );
            println!("documents written to {}", output_dir.display());
            Ok(())
        }
        CrawlOutcome::Cancelled => {
            println!("crawl cancelled");
            Ok(())
        }
        CrawlOutcome::Failed(message) => Err(anyhow::anyhow!("crawl failed: {}", message)),
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("seine=info,warn"),
            1 => EnvFilter::new("seine=debug,info"),
            2 => EnvFilter::new("seine=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
