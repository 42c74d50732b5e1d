//! Xpo-Harvest main entry point
//!
//! This is the command-line interface for the Xpo-Harvest event-site crawler.

use anyhow::Context;
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use xpo_harvest::config::{load_config_with_hash, Config, CrawlMode, RunOverrides, RunParams};
use xpo_harvest::crawler::run_crawl;
use xpo_harvest::output::{
    generate_markdown_summary, output_file_path, print_statistics, run_sink, JsonFileSink,
    JsonOptions,
};

/// Xpo-Harvest: an event-site crawler
///
/// Xpo-Harvest crawls one event website and writes either flat page records
/// (site mode) or event records enriched with the external sites each event
/// links to (events mode).
#[derive(Parser, Debug)]
#[command(name = "xpo-harvest")]
#[command(version = "1.0.0")]
#[command(about = "An event-site crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Start URL, overriding run.start-url
    #[arg(long, value_name = "URL")]
    start_url: Option<String>,

    /// Run label used in records and output file names
    #[arg(long, value_name = "NAME")]
    run_id: Option<String>,

    /// Depth limit, 0 for unlimited
    #[arg(long, value_name = "N")]
    depth: Option<u32>,

    /// Spider behavior
    #[arg(long, value_enum)]
    mode: Option<CrawlMode>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show the resolved run without crawling
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    let overrides = RunOverrides {
        start_url: cli.start_url,
        run_identifier: cli.run_id,
        depth_limit: cli.depth,
        mode: cli.mode,
    };
    let params = RunParams::resolve(&config, &overrides)?;

    if cli.dry_run {
        handle_dry_run(&config, &params);
        return Ok(());
    }

    handle_crawl(config, params).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("xpo_harvest=info,warn"),
            1 => EnvFilter::new("xpo_harvest=debug,info"),
            2 => EnvFilter::new("xpo_harvest=trace,debug"),
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

/// Handles the --dry-run mode: shows the resolved run
fn handle_dry_run(config: &Config, params: &RunParams) {
    println!("=== Xpo-Harvest Dry Run ===\n");

    println!("Run:");
    println!("  Identifier: {}", params.run_identifier);
    println!("  Mode: {}", params.mode.as_str());
    println!("  Start URL: {}", params.start_url);
    println!("  Primary authority: {}", params.primary_authority);
    if params.is_unlimited() {
        println!("  Depth limit: unlimited");
    } else {
        println!("  Depth limit: {}", params.depth_limit);
    }

    println!("\nCrawler:");
    println!(
        "  Max concurrent fetches: {}",
        config.crawler.max_concurrent_fetches
    );
    println!("  Request timeout: {}s", config.crawler.request_timeout);
    println!("  Download delay: {}ms", config.crawler.download_delay);
    println!("  User-Agent: {}", config.user_agent.header_value());

    if params.mode == CrawlMode::Events {
        println!("\nEvents:");
        println!("  Follow prefix: {}", config.events.follow_prefix);
        println!("  Event pattern: {}", config.events.event_pattern);
        println!("  Blacklisted domains ({}):", config.events.blacklist.len());
        for domain in &config.events.blacklist {
            println!("    - {}", domain);
        }
    }

    println!("\nOutput:");
    println!(
        "  Records: {}",
        output_file_path(
            Path::new(&config.output.output_dir),
            &params.run_identifier,
            params.mode
        )
        .display()
    );
    if let Some(summary) = &config.output.summary_path {
        println!("  Summary: {}", summary);
    }

    println!("\n✓ Configuration is valid");
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config, params: RunParams) -> anyhow::Result<()> {
    let file_sink = Arc::new(JsonFileSink::for_run(
        Path::new(&config.output.output_dir),
        &params.run_identifier,
        params.mode,
        JsonOptions::from(&config.output),
    ));
    let (sink, memory) = run_sink(
        file_sink.clone(),
        params.mode,
        config.output.summary_path.is_some(),
    );

    let stats = match run_crawl(&config, params, sink).await {
        Ok(stats) => stats,
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            return Err(e.into());
        }
    };

    print_statistics(&stats);
    println!("\nRecords: {}", file_sink.path().display());

    if let Some(summary_path) = &config.output.summary_path {
        let parents = memory.map(|m| m.parents()).unwrap_or_default();
        generate_markdown_summary(&stats, &parents, Path::new(summary_path))
            .with_context(|| format!("failed to write summary to {}", summary_path))?;
        println!("Summary: {}", summary_path);
    }

    Ok(())
}
