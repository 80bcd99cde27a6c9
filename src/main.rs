//! Sumi-Index main entry point
//!
//! This is the command-line interface for the Sumi-Index crawl-and-index engine.

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use sumi_index::config::{load_config, Config};
use sumi_index::output::{format_crawl_logs, format_search_results, print_statistics};
use sumi_index::Engine;
use tracing_subscriber::EnvFilter;

/// Sumi-Index: a small crawl-and-index search engine
///
/// Sumi-Index fetches single pages while respecting robots.txt and
/// refusing private network targets, stores their metadata and visible
/// text in SQLite, and answers keyword searches over what it has stored.
#[derive(Parser, Debug)]
#[command(name = "sumi-index")]
#[command(version = "1.0.0")]
#[command(about = "A small crawl-and-index search engine", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (defaults apply when omitted)
    #[arg(short, long, value_name = "CONFIG")]
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
    /// Crawl URLs and add them to the index
    Crawl {
        /// URLs to crawl; `http://` is assumed when no scheme is given
        #[arg(required = true)]
        urls: Vec<String>,
    },

    /// Search the index
    Search {
        /// Query terms
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,

        /// Maximum number of results
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Remove a page from the index
    Delete {
        url: String,
    },

    /// Manage the crawl queue
    Queue {
        #[command(subcommand)]
        action: QueueAction,
    },

    /// Rebuild the full-text index from stored pages
    Reindex,

    /// Show recent crawl attempts
    Logs {
        #[arg(short, long, default_value_t = 20)]
        limit: usize,
    },

    /// Show statistics from the database
    Stats,
}

#[derive(Subcommand, Debug)]
enum QueueAction {
    /// Queue URLs for a later crawl
    Add {
        #[arg(required = true)]
        urls: Vec<String>,
    },

    /// List queued URLs
    List {
        #[arg(short, long, default_value_t = 50)]
        limit: usize,
    },

    /// Crawl every queued URL
    Run,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            load_config(path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))?
        }
        None => {
            tracing::debug!("No configuration file given, using defaults");
            Config::default()
        }
    };

    let engine = Engine::new(config).context("Failed to open the index")?;

    match cli.command {
        Command::Crawl { urls } => handle_crawl(&engine, &urls).await,
        Command::Search { query, limit } => handle_search(&engine, &query.join(" "), limit),
        Command::Delete { url } => {
            if engine.delete(&url)? {
                println!("Deleted {}", url);
            } else {
                println!("Not indexed: {}", url);
            }
            Ok(())
        }
        Command::Queue { action } => handle_queue(&engine, action).await,
        Command::Reindex => {
            let indexed = engine.reindex()?;
            println!("Reindexed {} page(s)", indexed);
            Ok(())
        }
        Command::Logs { limit } => {
            print!("{}", format_crawl_logs(&engine.logs(limit)?));
            Ok(())
        }
        Command::Stats => {
            println!("Database: {}\n", engine.config().storage.database_path);
            print_statistics(&engine.stats()?);
            Ok(())
        }
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("sumi_index=info,warn"),
            1 => EnvFilter::new("sumi_index=debug,info"),
            2 => EnvFilter::new("sumi_index=trace,debug"),
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

/// Crawls each URL in turn; fails if none could be indexed
async fn handle_crawl(engine: &Engine, urls: &[String]) -> anyhow::Result<()> {
    let mut failures = 0;

    for url in urls {
        match engine.submit(url).await {
            Ok(page) => {
                let title = if page.title.is_empty() {
                    "(untitled)"
                } else {
                    page.title.as_str()
                };
                println!("✓ {} - {}", page.url, title);
            }
            Err(e) => {
                failures += 1;
                let kind = e.kind().map(|k| k.to_string()).unwrap_or_default();
                println!("✗ {} [{}] {}", url, kind, e);
            }
        }
    }

    if failures == urls.len() {
        anyhow::bail!("no page could be indexed");
    }
    Ok(())
}

fn handle_search(engine: &Engine, query: &str, limit: Option<usize>) -> anyhow::Result<()> {
    let results = engine.search(query, limit)?;
    print!("{}", format_search_results(query, &results));
    Ok(())
}

async fn handle_queue(engine: &Engine, action: QueueAction) -> anyhow::Result<()> {
    match action {
        QueueAction::Add { urls } => {
            for url in &urls {
                if engine.enqueue(url)? {
                    println!("Queued {}", url);
                } else {
                    println!("Already queued: {}", url);
                }
            }
        }
        QueueAction::List { limit } => {
            for queued in engine.queue(limit)? {
                println!("{} {}", queued.added_at, queued.url);
            }
        }
        QueueAction::Run => {
            let summary = engine.run_queue().await?;
            println!(
                "Crawled {} page(s), {} failure(s)",
                summary.crawled, summary.failed
            );
        }
    }
    Ok(())
}
