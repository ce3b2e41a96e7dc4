//! Sumi-Tide command-line interface
//!
//! A thin demonstration binary over the crawl engine: crawl a batch of
//! URLs, harvest magnet links, or validate a configuration file.

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use sumi_tide::config::{compute_config_hash, load_config};
use sumi_tide::crawler::CrawlEngine;
use sumi_tide::CrawlerConfig;
use tracing_subscriber::EnvFilter;

/// Sumi-Tide: an adaptive web-crawling engine
#[derive(Parser, Debug)]
#[command(name = "sumi-tide")]
#[command(version, about = "An adaptive web-crawling engine", long_about = None)]
struct Cli {
    /// Path to TOML configuration file; defaults apply when omitted
    #[arg(short, long, value_name = "CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose", global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Crawl URLs and print a batch report
    Crawl {
        /// URLs to fetch
        #[arg(value_name = "URL", required = true)]
        urls: Vec<String>,
    },

    /// Crawl URLs and print the magnet links found on them
    Magnets {
        /// URLs to harvest
        #[arg(value_name = "URL", required = true)]
        urls: Vec<String>,
    },

    /// Validate a configuration file and show what it declares
    Validate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose, cli.quiet);

    let config = match &cli.config {
        Some(path) => {
            let config = load_config(path)
                .with_context(|| format!("Failed to load {}", path.display()))?;
            tracing::info!("Configuration loaded from {}", path.display());
            config
        }
        None => CrawlerConfig::default(),
    };

    match cli.command {
        Command::Crawl { urls } => handle_crawl(config, urls).await,
        Command::Magnets { urls } => handle_magnets(config, urls).await,
        Command::Validate => handle_validate(&config, cli.config.as_deref()),
    }
}

/// Sets up the tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("sumi_tide=info,warn"),
            1 => EnvFilter::new("sumi_tide=debug,info"),
            2 => EnvFilter::new("sumi_tide=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Crawls the given URLs and prints the batch summary and engine stats
async fn handle_crawl(config: CrawlerConfig, urls: Vec<String>) -> anyhow::Result<()> {
    let engine = CrawlEngine::new(config)?;
    engine.start();
    let batch = engine.crawl_urls(urls).await;
    engine.stop();

    println!("=== Batch Summary ===");
    println!("  Total:      {}", batch.summary.total);
    println!("  Successful: {}", batch.summary.successful);
    println!("  Failed:     {}", batch.summary.failed);
    println!("  Skipped:    {}", batch.summary.skipped);
    println!("  Cached:     {}", batch.summary.cached);
    println!();

    println!("=== Results ===");
    for result in &batch.results {
        let annotation = match (&result.error, result.cached) {
            (Some(error), _) => format!(" ({})", error),
            (None, true) => " (cached)".to_string(),
            (None, false) => String::new(),
        };
        println!("  [{}] {}{}", result.status, result.url, annotation);
        if let Some(parsed) = &result.parsed {
            if let Some(adapter) = &parsed.adapter_used {
                println!("      adapter: {}", adapter);
            }
            if let Some(title) = parsed.field("title").and_then(|f| f.as_text()) {
                if !title.is_empty() {
                    println!("      title: {}", title);
                }
            }
        }
    }
    println!();

    print_stats(&engine);
    Ok(())
}

/// Crawls the given URLs and prints every magnet link found
async fn handle_magnets(config: CrawlerConfig, urls: Vec<String>) -> anyhow::Result<()> {
    let engine = CrawlEngine::new(config)?;
    engine.start();
    let magnets = engine.crawl_magnets(urls).await;
    engine.stop();

    if magnets.is_empty() {
        println!("No magnet links found");
    } else {
        println!("Found {} magnet link(s):", magnets.len());
        for magnet in magnets {
            println!("  {}", magnet);
        }
    }
    Ok(())
}

/// Validates the configuration and reports the declared sites
fn handle_validate(
    config: &CrawlerConfig,
    path: Option<&std::path::Path>,
) -> anyhow::Result<()> {
    // load_config already validated; reaching here means the file is good
    println!("Configuration is valid");
    if let Some(path) = path {
        let hash = compute_config_hash(path)?;
        println!("  hash: {}", hash);
    }
    println!("  max concurrent:  {}", config.max_concurrent);
    println!("  rate limit:      {:.1} req/s", config.rate_limit);
    println!("  optimization:    {}", config.optimization);
    println!("  cache:           {} entries, {}s TTL", config.cache_max_entries, config.cache_ttl_secs);
    println!("  memory limit:    {} MB", config.memory_limit_mb);
    println!("  sites:           {}", config.sites.len());
    for site in &config.sites {
        println!("    - {} ({})", site.name, site.url_pattern);
    }
    Ok(())
}

/// Prints the engine statistics block
fn print_stats(engine: &CrawlEngine) {
    let stats = engine.get_stats();
    println!("=== Statistics ===");
    println!("  Requests:        {}", stats.crawler.total_requests);
    println!(
        "  Success rate:    {:.1}%",
        stats.crawler.success_rate * 100.0
    );
    println!(
        "  Cache hit rate:  {:.1}%",
        stats.crawler.cache_hit_rate * 100.0
    );
    println!(
        "  Avg response:    {:.2}s",
        stats.crawler.average_response_time
    );
    println!("  Bytes fetched:   {}", stats.crawler.total_bytes);
    println!(
        "  Concurrency:     {}/{} ({})",
        stats.controller.concurrency.current,
        stats.controller.concurrency.max,
        stats.controller.concurrency.level
    );
    println!(
        "  Cache entries:   {} ({} bytes)",
        stats.cache.entry_count, stats.cache.approx_size
    );
}
