//! Trawl main entry point
//!
//! This is the command-line interface for the Trawl search crawler.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use trawl::config::{load_config_with_hash, load_keywords, load_whitelist, Config};
use trawl::output::{load_latest_statistics, print_statistics, save_run, RunStatistics};
use trawl::storage::SqliteSink;
use trawl::{ConfigError, Coordinator};
use tracing_subscriber::EnvFilter;

/// Trawl: keyword-driven search crawler
///
/// Trawl walks paginated search listings for every keyword, skips
/// whitelisted and duplicate links, and extracts an article record from
/// every result it keeps.
#[derive(Parser, Debug)]
#[command(name = "trawl")]
#[command(version = "1.0.0")]
#[command(about = "Keyword-driven search crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be searched without crawling
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show statistics of the latest stored run and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,

    /// Only walk the search listings, skip content extraction
    #[arg(long)]
    no_extract: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (mut config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if cli.no_extract {
        config.output.extract_content = false;
    }

    let database_path = input_path(&cli.config, &config.output.database_path);
    if cli.stats {
        return handle_stats(&database_path);
    }

    let keywords_path = input_path(&cli.config, &config.input.keywords_path);
    let whitelist_path = input_path(&cli.config, &config.input.whitelist_path);
    let keywords = load_keywords(&keywords_path);
    let whitelist = load_whitelist(&whitelist_path);

    if cli.dry_run {
        handle_dry_run(&config, &keywords, &whitelist);
        return Ok(());
    }

    if keywords.is_empty() {
        tracing::error!("No keywords found in {}", keywords_path.display());
        return Err(ConfigError::MissingKeywords(format!(
            "nothing found in {}",
            keywords_path.display()
        ))
        .into());
    }

    handle_crawl(config, &config_hash, &database_path, keywords, whitelist).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("trawl=info,warn"),
            1 => EnvFilter::new("trawl=debug,info"),
            2 => EnvFilter::new("trawl=trace,debug"),
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

/// Relative input and output paths are taken relative to the config file's directory
fn input_path(config_path: &Path, path: &str) -> PathBuf {
    let path = Path::new(path);
    if path.is_absolute() {
        return path.to_path_buf();
    }
    match config_path.parent() {
        Some(dir) => dir.join(path),
        None => path.to_path_buf(),
    }
}

/// Handles the --dry-run mode: shows the effective configuration and inputs
fn handle_dry_run(config: &Config, keywords: &[String], whitelist: &[String]) {
    println!("=== Trawl Dry Run ===\n");

    println!("Search:");
    println!("  Base URL: {}", config.search.base_url);
    println!(
        "  Language / region: {} / {}",
        config.search.language, config.search.region
    );
    println!("  Results per keyword: {}", config.search.results_per_keyword);
    println!("  Max pages: {}", config.search.max_pages);
    println!("  Concurrency: {}", config.search.concurrency);
    match config.search.run_timeout() {
        Some(timeout) => println!("  Run timeout: {}s", timeout.as_secs()),
        None => println!("  Run timeout: none"),
    }

    println!("\nFetch:");
    println!("  Request timeout: {}s", config.fetch.request_timeout_secs);
    println!(
        "  Retries: {} on {:?}",
        config.fetch.retry_times, config.fetch.retry_http_codes
    );
    println!("  Article timeout: {}s", config.fetch.article_timeout_secs);

    println!("\nPoliteness:");
    println!(
        "  Delay: start {}ms, bounds {}ms..{}ms",
        config.politeness.start_delay_ms,
        config.politeness.min_delay_ms,
        config.politeness.max_delay_ms
    );

    println!("\nBrowser:");
    println!("  Enabled: {}", config.browser.enabled);
    println!("  Headless: {}", config.browser.headless);
    println!("  Compiled in: {}", cfg!(feature = "chrome"));

    println!("\nOutput:");
    println!("  Database: {}", config.output.database_path);
    println!("  Extract content: {}", config.output.extract_content);

    println!("\nKeywords ({}):", keywords.len());
    for keyword in keywords {
        println!("  - {}", keyword);
    }

    println!("\nWhitelisted Domains ({}):", whitelist.len());
    for domain in whitelist {
        println!("  - {}", domain);
    }

    println!("\n✓ Configuration is valid");
    if keywords.is_empty() {
        println!("✗ No keywords to search");
    } else {
        println!("✓ Would search {} keywords", keywords.len());
    }
}

/// Handles the --stats mode: shows statistics from the database
fn handle_stats(database_path: &Path) -> Result<()> {
    println!("Database: {}\n", database_path.display());

    let sink = SqliteSink::new(database_path).context("Failed to open result database")?;

    match load_latest_statistics(&sink)? {
        Some(stats) => print_statistics(&stats),
        None => println!("No runs stored yet"),
    }

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(
    config: Config,
    config_hash: &str,
    database_path: &Path,
    keywords: Vec<String>,
    whitelist: Vec<String>,
) -> Result<()> {
    tracing::info!(
        "Keywords: {}, whitelisted domains: {}",
        keywords.len(),
        whitelist.len()
    );

    // Open the sink up front so a bad path fails before any crawling
    let mut sink = SqliteSink::new(database_path).context("Failed to open result database")?;

    let coordinator = Coordinator::from_config(&config, whitelist)?;

    let cancel = coordinator.cancel_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, finishing in-flight work");
            cancel.cancel("interrupted");
        }
    });

    let outcome = coordinator.run(&keywords).await;
    coordinator.shutdown().await;

    let output = match outcome {
        Ok(output) => output,
        Err(e) => {
            tracing::error!("Run failed: {}", e);
            return Err(e.into());
        }
    };

    let run_id = save_run(&mut sink, config_hash, &output).context("Failed to store results")?;

    let mut stats = RunStatistics::from_run_output(&output);
    stats.run_id = Some(run_id);
    print_statistics(&stats);

    if output.cancelled {
        tracing::warn!("Run #{} was cancelled before completion", run_id);
    } else {
        tracing::info!("Run #{} completed successfully", run_id);
    }

    Ok(())
}
