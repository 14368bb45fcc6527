//! hostcrawl main entry point
//!
//! This is the command-line interface for the hostcrawl single-host crawler.

use anyhow::Context;
use clap::Parser;
use hostcrawl::config::{load_config, validate, Config, FilterConfig};
use hostcrawl::crawler::Pipeline;
use hostcrawl::output::{print_statistics, CrawlStats, StdoutObserver};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// hostcrawl: a concurrent single-host web crawler
///
/// hostcrawl starts from a seed URL and keeps following links that stay on
/// the seed's host, printing every accepted URL with its running count,
/// until it is interrupted with Ctrl-C.
#[derive(Parser, Debug)]
#[command(name = "hostcrawl")]
#[command(version)]
#[command(about = "A concurrent single-host web crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Override the seed URL from the configuration
    #[arg(long, value_name = "URL")]
    seed: Option<String>,

    /// Override the number of concurrent fetches
    #[arg(long, value_name = "N")]
    workers: Option<usize>,

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
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let mut config = load_config(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;

    if cli.seed.is_some() || cli.workers.is_some() {
        if let Some(seed) = cli.seed {
            config.crawler.seed = seed;
        }
        if let Some(workers) = cli.workers {
            config.crawler.workers = workers;
        }
        validate(&config).context("Invalid command-line override")?;
    }

    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(());
    }

    handle_crawl(config).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("hostcrawl=info,warn"),
            1 => EnvFilter::new("hostcrawl=debug,info"),
            2 => EnvFilter::new("hostcrawl=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Handles the --dry-run mode: shows the effective configuration
fn handle_dry_run(config: &Config) {
    println!("=== hostcrawl Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Seed: {}", config.crawler.seed);
    println!(
        "  Host: {}",
        config.crawler.host.as_deref().unwrap_or("(seed authority)")
    );
    println!("  Workers: {}", config.crawler.workers);
    println!("  Queue capacity: {}", config.crawler.queue_capacity);
    println!("  Backpressure: {:?}", config.crawler.backpressure);
    println!(
        "  Link pattern: {}",
        config.crawler.link_pattern.as_deref().unwrap_or("(default)")
    );

    println!("\nHTTP:");
    println!("  User agent: {}", config.http.user_agent);
    println!("  Timeout: {}s", config.http.timeout_secs);
    println!("  Connect timeout: {}s", config.http.connect_timeout_secs);

    match &config.filters {
        None => println!("\nFilters: host-contains (default)"),
        Some(filters) => {
            println!("\nFilters ({}):", filters.len());
            for filter in filters {
                println!("  - {}", describe_filter(filter));
            }
        }
    }

    println!("\n✓ Configuration is valid");
}

fn describe_filter(filter: &FilterConfig) -> String {
    match filter {
        FilterConfig::HostContains => "host-contains".to_string(),
        FilterConfig::HostEquals => "host-equals".to_string(),
        FilterConfig::IncludePattern { pattern } => format!("include-pattern {}", pattern),
        FilterConfig::ExcludePattern { pattern } => format!("exclude-pattern {}", pattern),
        FilterConfig::PathPrefix { prefix } => format!("path-prefix {}", prefix),
    }
}

/// Runs the crawl until Ctrl-C, then prints statistics
async fn handle_crawl(config: Config) -> anyhow::Result<()> {
    let stats = Arc::new(CrawlStats::new());

    let mut pipeline = Pipeline::from_config(&config)
        .context("Failed to build crawl pipeline")?
        .with_observer(Arc::new(StdoutObserver))
        .with_observer(stats.clone());

    pipeline.run()?;
    pipeline
        .submit(config.crawler.seed.trim())
        .await
        .context("Failed to submit seed URL")?;

    tracing::info!("Crawling {} (press Ctrl-C to stop)", pipeline.target());

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl-C")?;

    pipeline.shutdown();
    pipeline.stopped().await;

    tracing::info!("Crawl stopped after {} accepted URLs", pipeline.counter().get());
    println!();
    print_statistics(&stats.snapshot());

    Ok(())
}
