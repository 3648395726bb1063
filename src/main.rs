//! Catalog Harvest main entry point
//!
//! This is the command-line interface for the Catalog Harvest listing crawler.

use anyhow::Context;
use catalog_harvest::config::{load_config_with_hash, Config, SiteConfig};
use catalog_harvest::crawler::{
    crawl_sites, reprocess_sites, select_sites, HttpFetcher, RunOptions,
};
use catalog_harvest::sequence::Step;
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Candidate identifiers shown per site in a dry run
const DRY_RUN_PREVIEW: usize = 3;

/// Catalog Harvest: an incremental listing crawler
///
/// Catalog Harvest walks the identifier space of configured listing sites,
/// caches every page it fetches and folds the extracted product fields into
/// a shared SQLite catalog.
#[derive(Parser, Debug)]
#[command(name = "catalog-harvest")]
#[command(version)]
#[command(about = "An incremental listing crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Site id to crawl, or `all` for every configured site
    #[arg(long, default_value = "all")]
    site: String,

    /// Identifier to start from instead of the configured start id
    #[arg(long, value_name = "ID")]
    start: Option<String>,

    /// Stop each site after this many imports
    #[arg(long, value_name = "N")]
    limit: Option<u64>,

    /// Fetch every candidate even when a cached capture exists
    #[arg(long, conflicts_with = "reprocess")]
    refetch: bool,

    /// Fold pending cached captures into the catalog without network access
    #[arg(long, conflicts_with_all = ["refetch", "start", "limit"])]
    reprocess: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long, conflicts_with_all = ["stats", "reprocess"])]
    dry_run: bool,

    /// Show statistics from the database and exit
    #[arg(long, conflicts_with_all = ["dry_run", "reprocess"])]
    stats: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let config = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            cfg
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    if cli.dry_run {
        handle_dry_run(&config, &cli.site)?;
    } else if cli.stats {
        handle_stats(&config)?;
    } else if cli.reprocess {
        handle_reprocess(&config, &cli.site)?;
    } else {
        let options = RunOptions {
            limit: cli.limit,
            start: cli.start.clone(),
            refetch: cli.refetch,
        };
        handle_crawl(&config, &cli.site, &options).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("catalog_harvest=info,warn"),
            1 => EnvFilter::new("catalog_harvest=debug,info"),
            2 => EnvFilter::new("catalog_harvest=trace,debug"),
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

/// Handles the --dry-run mode: validates config and shows each site's plan
fn handle_dry_run(config: &Config, selector: &str) -> Result<(), Box<dyn std::error::Error>> {
    let sites = select_sites(config, selector)?;

    println!("=== Catalog Harvest Dry Run ===\n");

    println!("Fetcher:");
    println!("  User agent: {}", config.fetcher.user_agent());
    println!("  Timeout: {}s", config.fetcher.timeout_secs);

    println!("\nStorage:");
    println!("  Database: {}", config.storage.database_path);

    println!("\nSites ({}):", sites.len());
    for site in &sites {
        print_site_plan(site)?;
    }

    println!("\n✓ Configuration is valid");
    println!("✓ Would crawl {} site(s)", sites.len());

    Ok(())
}

/// Prints the scheme, throttle and first candidates of one site
fn print_site_plan(site: &SiteConfig) -> Result<(), Box<dyn std::error::Error>> {
    println!("  - {} ({})", site.id, site.name);
    println!("    Scheme: {} ({})", site.scheme.name(), site.direction);
    println!(
        "    Range: {} .. {}",
        site.start_id,
        site.end_id.as_deref().unwrap_or("(open)")
    );
    println!(
        "    Breaker: {} consecutive failures",
        site.breaker_threshold
    );
    println!("    Delay: {}ms (+ up to {}ms jitter)", site.delay_ms, site.jitter_ms);
    println!("    Extraction: {}", site.extraction.name());
    if let Some(api_url) = &site.api_url {
        println!("    Side channel: {}", api_url);
    }

    let mut cursor = site.scheme.parse_strict(&site.start_id)?;
    println!("    First candidates:");
    for _ in 0..DRY_RUN_PREVIEW {
        let id = site.scheme.render(&cursor);
        println!("      * {} -> {}", id, site.page_url_for(&id));
        match site.scheme.next(&cursor, site.direction) {
            Step::Next(next) => cursor = next,
            Step::Exhausted => break,
        }
    }

    Ok(())
}

/// Handles the --stats mode: shows statistics from the database
fn handle_stats(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    use catalog_harvest::output::{load_statistics, print_statistics};

    println!("Database: {}\n", config.storage.database_path);

    let storage = open_database(&config.storage.database_path)?;
    let stats = load_statistics(&storage)?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the --reprocess mode: folds pending captures without fetching
fn handle_reprocess(config: &Config, selector: &str) -> Result<(), Box<dyn std::error::Error>> {
    use catalog_harvest::output::print_run_summaries;

    let sites = select_sites(config, selector)?;
    let mut storage = open_database(&config.storage.database_path)?;
    let fetcher = HttpFetcher::new(&config.fetcher)?;

    tracing::info!("Reprocessing pending captures for {} site(s)", sites.len());
    let summaries = reprocess_sites(&fetcher, &mut storage, &sites)?;
    print_run_summaries(&summaries);

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(
    config: &Config,
    selector: &str,
    options: &RunOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    use catalog_harvest::output::print_run_summaries;

    let sites = select_sites(config, selector)?;
    let mut storage = open_database(&config.storage.database_path)?;
    let fetcher = HttpFetcher::new(&config.fetcher).context("building HTTP client")?;

    tracing::info!(
        "Starting crawl of {} site(s) as {}",
        sites.len(),
        config.fetcher.user_agent()
    );
    if options.refetch {
        tracing::info!("Refetch enabled: cached captures will be fetched again");
    }

    match crawl_sites(&fetcher, &mut storage, &sites, options).await {
        Ok(summaries) => {
            tracing::info!("Crawl completed successfully");
            print_run_summaries(&summaries);
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e.into())
        }
    }
}

/// Opens the catalog database; failure here is fatal
fn open_database(path: &str) -> anyhow::Result<catalog_harvest::storage::SqliteStorage> {
    catalog_harvest::storage::open_storage(Path::new(path))
        .with_context(|| format!("opening database {}", path))
}
