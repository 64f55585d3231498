//! Feed-Sweep main entry point
//!
//! This is the command-line interface for the Feed-Sweep profile crawler.

use anyhow::Context;
use clap::Parser;
use feed_sweep::config::{load_config_with_hash, validate, Config, SessionMode};
use feed_sweep::crawler::run_crawl;
use feed_sweep::output::print_report;
use feed_sweep::session::SessionError;
use feed_sweep::url::profile_url;
use feed_sweep::SweepError;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Feed-Sweep: an infinite-scroll profile feed crawler
///
/// Feed-Sweep opens a profile page in a browser, reads its header and
/// scrolls the feed until no new posts appear, then writes everything it
/// collected to a JSON document.
#[derive(Parser, Debug)]
#[command(name = "feed-sweep")]
#[command(version = "1.0.0")]
#[command(about = "An infinite-scroll profile feed crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Crawl this username instead of the one in the configuration
    #[arg(short, long)]
    username: Option<String>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (mut config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if let Some(username) = cli.username {
        config.target.username = username;
        validate(&config).context("Invalid --username")?;
    }

    if cli.dry_run {
        handle_dry_run(&config)?;
    } else {
        handle_crawl(config, cli.quiet).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("feed_sweep=info,warn"),
            1 => EnvFilter::new("feed_sweep=debug,info"),
            2 => EnvFilter::new("feed_sweep=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: validates config and shows what would be crawled
fn handle_dry_run(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Feed-Sweep Dry Run ===\n");

    let username = config.username();
    println!("Target:");
    println!("  Username: @{}", username);
    println!(
        "  Profile URL: {}",
        profile_url(&config.target.base_url, &username)?
    );

    println!("\nCrawler Configuration:");
    println!("  Scroll delay: {}ms", config.crawler.scroll_delay_ms);
    println!("  Scroll increment: {}px", config.crawler.scroll_increment);
    println!("  Max idle scrolls: {}", config.crawler.max_idle_scrolls);
    println!("  Page load timeout: {}ms", config.crawler.page_load_timeout_ms);
    match config.crawler.max_crawl_secs {
        Some(secs) => println!("  Deadline: {}s", secs),
        None => println!("  Deadline: none"),
    }

    println!("\nSession:");
    match config.session.mode {
        SessionMode::Launch => println!(
            "  Launch a new browser (headless: {})",
            config.session.headless
        ),
        SessionMode::Attach => println!(
            "  Attach to {}",
            config.session.endpoint.as_deref().unwrap_or("?")
        ),
        SessionMode::Replay => println!(
            "  Replay snapshots from {}",
            config.session.replay_dir.as_deref().unwrap_or("?")
        ),
    }

    println!("\nEnrichment:");
    match &config.enrichment {
        Some(enrichment) => {
            println!("  Image directory: {}", enrichment.image_dir);
            println!(
                "  Captions: {}",
                enrichment.caption_endpoint.as_deref().unwrap_or("disabled")
            );
            println!(
                "  Concurrent downloads: {}",
                enrichment.max_concurrent_downloads
            );
        }
        None => println!("  Disabled (images recorded by URL only)"),
    }

    println!("\nOutput:");
    println!("  Document: {}", config.document_path());
    if let Some(key) = &config.output.source_key {
        println!("  Nested under: \"{}\"", key);
    }

    println!("\n✓ Configuration is valid");

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config, quiet: bool) -> Result<(), Box<dyn std::error::Error>> {
    let cancel = CancellationToken::new();

    // Ctrl-C stops the loop; posts collected so far are still written
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, finishing with the posts collected so far");
            interrupt.cancel();
        }
    });

    tracing::info!("Starting crawl of @{}", config.username());

    match run_crawl(config, cancel).await {
        Ok(report) => {
            if report.termination.is_complete() {
                tracing::info!("Crawl completed: {}", report.termination);
            } else {
                tracing::warn!("Crawl stopped early: {}", report.termination);
            }
            if !quiet {
                println!();
                print_report(&report);
            }
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            if let Some(hint) = remediation(&e) {
                eprintln!("\n{}", hint);
            }
            Err(e.into())
        }
    }
}

/// Suggests a fix for errors the operator can act on
fn remediation(error: &SweepError) -> Option<&'static str> {
    match error {
        SweepError::Session(SessionError::Attach { .. } | SessionError::NoPage) => Some(
            "Start Chrome with remote debugging enabled and open any tab, e.g.\n  \
             google-chrome --remote-debugging-port=9222\n\
             then point session.endpoint at http://127.0.0.1:9222, \
             or set session.mode = \"launch\" to use a fresh browser.",
        ),
        SweepError::Session(SessionError::Navigation { .. }) => Some(
            "The profile page could not be opened. Check the network connection and \
             target.base-url, and make sure the browser session is still running.",
        ),
        SweepError::Session(SessionError::Launch(_)) => Some(
            "Could not start a browser. Make sure Chrome or Chromium is installed, \
             or set session.mode = \"attach\" to reuse a running browser.",
        ),
        SweepError::PageLoadTimeout { .. } => Some(
            "The profile never rendered. The account may not exist or the site may \
             require a login; attach to a signed-in browser with session.mode = \"attach\". \
             A partial document was written.",
        ),
        SweepError::Aborted(_) => {
            Some("The browser session failed mid-crawl. A partial document was written.")
        }
        _ => None,
    }
}
