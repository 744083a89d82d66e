//! Spider main entry point
//!
//! This is the command-line interface for the arachnida image spider.

use anyhow::Context;
use arachnida::config::{load_config, validate, Config};
use arachnida::crawler::run_crawl;
use arachnida::output::print_summary;
use arachnida::url::parse_start_url;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Spider: downloads the images of a single website
///
/// Spider fetches the start page, saves every .jpg, .jpeg, .png, .gif and .bmp
/// image it references, and with -r follows same-host links down to the
/// maximum depth.
#[derive(Parser, Debug)]
#[command(name = "spider")]
#[command(version = "1.0.0")]
#[command(about = "Downloads the images of a website", long_about = None)]
struct Cli {
    /// Start URL (http:// or https://)
    #[arg(value_name = "URL")]
    url: String,

    /// Follow links on the start URL's host
    #[arg(short, long)]
    recursive: bool,

    /// Maximum depth of followed links [default: 5]
    #[arg(short = 'l', long = "level", value_name = "N")]
    level: Option<u32>,

    /// Directory downloaded images are written to [default: ./data]
    #[arg(short, long, value_name = "PATH")]
    path: Option<PathBuf>,

    /// Path to TOML configuration file
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    // Reject a bad start URL before anything touches the network
    let start_url = match parse_start_url(&cli.url) {
        Ok(url) => url,
        Err(e) => {
            eprintln!("spider: {}", e);
            std::process::exit(1);
        }
    };

    let config = build_config(&cli)?;

    let stats = run_crawl(config, start_url)
        .await
        .context("crawl failed")?;

    print_summary(&stats);

    Ok(())
}

/// Loads the configuration file, if any, and applies the command-line overrides
fn build_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            load_config(path)
                .with_context(|| format!("failed to load configuration from {}", path.display()))?
        }
        None => Config::default(),
    };

    if cli.recursive {
        config.crawler.recursive = true;
    }
    if let Some(level) = cli.level {
        config.crawler.max_depth = level;
    }
    if let Some(path) = &cli.path {
        config.crawler.output_dir = path.clone();
    }

    validate(&config).context("invalid configuration")?;

    Ok(config)
}

/// Sets up the logging/tracing subscriber based on verbosity level
///
/// Logs go to stderr; stdout is reserved for download lines and the summary.
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("arachnida=info,warn"),
            1 => EnvFilter::new("arachnida=debug,info"),
            2 => EnvFilter::new("arachnida=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}
