//! Burrow main entry point
//!
//! This is the command-line interface for the Burrow page harvester.

use burrow::config::{config_fingerprint, load_config, validate, Config};
use burrow::crawler::Coordinator;
use burrow::output::{load_statistics, print_statistics, print_summary};
use burrow::storage::{open_storage, Storage};
use burrow::url::is_eligible;
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Burrow: a depth-bounded recursive page harvester
///
/// Burrow starts from a list of seed addresses, follows their links
/// depth-first through an optional proxy, extracts the title, headings,
/// paragraphs and links of every page, and stores each address once.
#[derive(Parser, Debug)]
#[command(name = "burrow")]
#[command(version)]
#[command(about = "A depth-bounded recursive page harvester", long_about = None)]
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

    /// Additional seed address (repeatable)
    #[arg(long = "seed", value_name = "URL")]
    seeds: Vec<String>,

    /// Override the maximum crawl depth
    #[arg(long, value_name = "N")]
    max_depth: Option<u32>,

    /// Override the number of workers
    #[arg(long, value_name = "N")]
    workers: Option<usize>,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show statistics from the database and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let mut config = match load_config(&cli.config) {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    apply_overrides(&mut config, &cli);
    if let Err(e) = validate(&config) {
        tracing::error!("Invalid command-line overrides: {}", e);
        return Err(e.into());
    }

    // Fingerprint the settings the run will actually use
    let config_hash = config_fingerprint(&config)?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    // Handle different modes
    if cli.dry_run {
        handle_dry_run(&config);
    } else if cli.stats {
        handle_stats(&config)?;
    } else {
        handle_crawl(&config, &config_hash).await?;
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
            0 => EnvFilter::new("burrow=info,warn"),
            1 => EnvFilter::new("burrow=debug,info"),
            2 => EnvFilter::new("burrow=trace,debug"),
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

/// Folds command-line seeds and overrides into the loaded configuration
fn apply_overrides(config: &mut Config, cli: &Cli) {
    config.seeds.extend(cli.seeds.iter().cloned());

    if let Some(max_depth) = cli.max_depth {
        config.crawler.max_depth = max_depth;
    }
    if let Some(workers) = cli.workers {
        config.crawler.workers = workers;
    }
}

/// Handles the --dry-run mode: shows what would be crawled
fn handle_dry_run(config: &Config) {
    println!("=== Burrow Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Max depth: {}", config.crawler.max_depth);
    println!("  Workers: {}", config.crawler.workers);
    println!("  Links followed per page: {}", config.crawler.link_limit);
    println!("  Paragraphs kept per page: {}", config.crawler.paragraph_limit);
    println!("  Strip fragments: {}", config.crawler.strip_fragments);

    println!("\nPoliteness:");
    println!(
        "  Delay: {}ms + up to {}ms jitter",
        config.politeness.base_delay_ms, config.politeness.jitter_ms
    );

    println!("\nNetwork:");
    println!(
        "  Proxy: {}",
        config.network.proxy.as_deref().unwrap_or("none")
    );
    println!("  User agent: {}", config.network.user_agent);
    println!("  Timeout: {}s", config.network.timeout_secs);

    println!("\nOutput:");
    println!("  Database: {}", config.output.database_path);

    let eligible = config.seeds.iter().filter(|s| is_eligible(s)).count();

    println!("\nSeeds ({}):", config.seeds.len());
    for seed in &config.seeds {
        if is_eligible(seed) {
            println!("  - {}", seed);
        } else {
            println!("  - {} (skipped: not a crawlable address)", seed);
        }
    }

    println!("\n✓ Configuration is valid");
    println!(
        "✓ Would start crawling with {} seed URLs on {} workers",
        eligible,
        config.crawler.workers.min(eligible)
    );
}

/// Handles the --stats mode: shows statistics from the database
fn handle_stats(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    println!("Database: {}\n", config.output.database_path);

    let storage = open_storage(Path::new(&config.output.database_path))?;
    let stats = load_statistics(&storage)?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(
    config: &Config,
    config_hash: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    if config.seeds.is_empty() {
        tracing::warn!("No seeds configured; nothing to crawl");
    }

    let storage: Arc<dyn Storage> = Arc::new(open_storage(Path::new(
        &config.output.database_path,
    ))?);
    let coordinator =
        Coordinator::from_config(config, Arc::clone(&storage)).with_config_hash(config_hash);

    // Ctrl-C stops new fetches; the run still finishes with a summary
    let shutdown = coordinator.shutdown_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, finishing in-flight pages");
            shutdown.cancel();
        }
    });

    match coordinator.run(&config.seeds).await {
        Ok(summary) => {
            print_summary(&summary);
            let stats = load_statistics(storage.as_ref())?;
            print_statistics(&stats);
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e.into())
        }
    }
}
