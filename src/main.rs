//! Lexicrawl main entry point
//!
//! This is the command-line interface that starts the Lexicrawl search server.

use clap::Parser;
use lexicrawl::api::{router, AppState};
use lexicrawl::config::{load_config_with_hash, Config};
use lexicrawl::crawler::IndexingService;
use lexicrawl::indexer::Indexer;
use lexicrawl::lemmatizer::Lemmatizer;
use lexicrawl::search::{SearchCache, SearchEngine};
use lexicrawl::statistics::load_statistics;
use lexicrawl::storage::{into_shared, open_storage};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Lexicrawl: a per-site lemma search engine
///
/// Lexicrawl crawls the configured sites, indexes the normalized word forms
/// of every page and serves ranked full-text search over HTTP.
#[derive(Parser, Debug)]
#[command(name = "lexicrawl")]
#[command(version = "1.0.0")]
#[command(about = "A per-site lemma search engine", long_about = None)]
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

    /// Address to listen on, overriding the configuration
    #[arg(long, value_name = "ADDR")]
    bind: Option<String>,

    /// Validate the configuration and dictionaries, then exit
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Print index statistics from the database and exit
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
    let mut config = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            cfg
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    if let Some(bind) = cli.bind {
        config.server.bind_address = bind;
    }

    if cli.dry_run {
        handle_dry_run(&config)
    } else if cli.stats {
        handle_stats(&config)
    } else {
        handle_serve(config).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("lexicrawl=info,warn"),
            1 => EnvFilter::new("lexicrawl=debug,info"),
            2 => EnvFilter::new("lexicrawl=trace,debug"),
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

/// Handles the --dry-run mode: loads dictionaries and shows what would be indexed
fn handle_dry_run(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    Lemmatizer::from_config(&config.morphology)?;
    let bind: SocketAddr = config.server.bind_address.parse()?;

    println!("=== Lexicrawl Dry Run ===\n");
    println!("Server: {}", bind);
    println!("Database: {}", config.storage.database_path);
    println!(
        "Crawler: {} concurrent fetches, {}ms politeness delay, {}s timeout",
        config.crawler.max_concurrent_fetches,
        config.crawler.politeness_delay_ms,
        config.crawler.request_timeout_secs
    );

    println!("\nSites ({}):", config.sites.len());
    for site in &config.sites {
        println!("  - {} ({})", site.url, site.name);
    }

    println!("\n✓ Configuration and dictionaries are valid");
    Ok(())
}

/// Handles the --stats mode: prints statistics from the database
fn handle_stats(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let storage = open_storage(Path::new(&config.storage.database_path))?;
    let stats = load_statistics(&storage, &config.sites, false)?;

    println!("=== Index Statistics ===\n");
    println!(
        "Sites: {}, pages: {}, lemmas: {}",
        stats.total.sites, stats.total.pages, stats.total.lemmas
    );
    for site in &stats.detailed {
        println!(
            "  {} [{}] {} pages, {} lemmas{}",
            site.url,
            site.status,
            site.pages,
            site.lemmas,
            site.error
                .as_deref()
                .map(|e| format!(" ({})", e))
                .unwrap_or_default()
        );
    }

    Ok(())
}

/// Wires up the services and serves the API until the process is stopped
async fn handle_serve(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let bind: SocketAddr = config.server.bind_address.parse()?;

    // Missing or broken dictionaries are fatal
    let lemmatizer = match Lemmatizer::from_config(&config.morphology) {
        Ok(lemmatizer) => Arc::new(lemmatizer),
        Err(e) => {
            tracing::error!("Failed to load morphology: {}", e);
            return Err(e.into());
        }
    };

    let storage = into_shared(open_storage(Path::new(&config.storage.database_path))?);
    tracing::info!("Database opened at {}", config.storage.database_path);

    let config = Arc::new(config);
    let cache = Arc::new(SearchCache::from_config(&config.search));
    let indexer = Indexer::new(lemmatizer.clone(), storage.clone());

    let indexing = Arc::new(IndexingService::new(
        config.clone(),
        indexer,
        cache.clone(),
    )?);
    let recovered = indexing.recover_interrupted()?;
    if recovered > 0 {
        tracing::warn!("Marked {} interrupted site(s) as failed", recovered);
    }

    let search = Arc::new(SearchEngine::new(
        storage.clone(),
        lemmatizer,
        cache,
        config.search.snippet_length,
    ));

    let app = router(Arc::new(AppState {
        config,
        storage,
        indexing,
        search,
    }));

    let listener = tokio::net::TcpListener::bind(bind).await?;
    tracing::info!("HTTP server listening on {}", bind);
    axum::serve(listener, app).await?;

    Ok(())
}
