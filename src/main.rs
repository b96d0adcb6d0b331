// masothue: command-line registry lookups
//
// Logging goes to stderr through tracing-subscriber; RUST_LOG overrides the
// default filter and --verbose raises it to debug.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing_subscriber::EnvFilter;

use masothue::{
    BatchObserver, BatchRow, BatchRunner, LookupClient, LookupConfig, LookupError, ResultCache,
    SearchResult, dedup_queries,
};

#[derive(Parser, Debug)]
#[command(name = "masothue", version, about = "Look up Vietnamese business registry records")]
struct Cli {
    /// JSON configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Search by tax code or company name
    Search {
        query: String,
        /// Fetch detail pages for name matches too
        #[arg(long, default_value_t = false)]
        details: bool,
    },
    /// Look up every line of a file
    Batch { file: PathBuf },
    /// Manage the result cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Subcommand, Debug)]
enum CacheAction {
    /// Remove expired entries and enforce the size limit
    Prune,
    /// Remove every entry
    Clear,
}

fn init_logging(verbose: bool) {
    let default = if verbose { "masothue=debug" } else { "masothue=info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&PathBuf>) -> Result<LookupConfig> {
    match path {
        Some(path) => LookupConfig::from_json_file(path)
            .with_context(|| format!("failed to load config from {}", path.display())),
        None => Ok(LookupConfig::default()),
    }
}

fn print_result(result: &SearchResult) {
    println!("{}", result.to_display_string());
}

/// Prints progress lines for the batch subcommand
struct ConsoleObserver;

impl BatchObserver for ConsoleObserver {
    fn on_progress(&self, ordinal: usize, total: usize, query: &str) {
        eprintln!("[{ordinal}/{total}] {query}");
    }

    fn on_result(&self, row: &BatchRow) {
        match (&row.result, &row.error) {
            (Some(result), _) => print_result(result),
            (None, Some(error)) => println!("{}: {error}", row.query),
            (None, None) => println!("{}: không tìm thấy", row.query),
        }
    }

    fn on_verification_required(&self, ordinal: usize, total: usize, message: &str) {
        eprintln!("[{ordinal}/{total}] {message}");
    }
}

fn report(error: &LookupError) -> anyhow::Error {
    let message = error.user_message();
    if message.is_empty() {
        anyhow::anyhow!("{error}")
    } else {
        anyhow::anyhow!("{message}")
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = load_config(cli.config.as_ref())?;

    let cancelled = Arc::new(AtomicBool::new(false));
    {
        let cancelled = Arc::clone(&cancelled);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Interrupt received, stopping");
                cancelled.store(true, Ordering::SeqCst);
            }
        });
    }

    match cli.command {
        Command::Search { query, details } => {
            if details {
                config = config.into_builder().fetch_details_for_names(true).build()?;
            }
            let client = LookupClient::new(config)?;
            let results = match client.lookup(&query, &cancelled).await {
                Ok(results) => results,
                Err(LookupError::Cancelled) => return Ok(()),
                Err(e) => return Err(report(&e)),
            };
            if results.is_empty() {
                println!("Không tìm thấy kết quả cho '{query}'");
            }
            for result in &results {
                print_result(result);
            }
        }
        Command::Batch { file } => {
            let contents = std::fs::read_to_string(&file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            let queries = dedup_queries(contents.lines());
            let client = LookupClient::new(config)?;
            let outcome = BatchRunner::new(&client)
                .run(&queries, &ConsoleObserver, &cancelled)
                .await;
            let failed = outcome.rows.iter().filter(|row| row.is_error()).count();
            let ending = if outcome.cancelled {
                ", cancelled"
            } else if outcome.blocked {
                ", stopped for verification"
            } else {
                ""
            };
            eprintln!(
                "{} / {} queries processed, {failed} failed{ending}",
                outcome.completed,
                queries.len()
            );
        }
        Command::Cache { action } => {
            let cache = ResultCache::from_config(&config);
            match action {
                CacheAction::Prune => {
                    let stats = cache.prune();
                    println!("{}", serde_json::to_string_pretty(&stats)?);
                }
                CacheAction::Clear => {
                    let deleted = cache.clear();
                    println!("Removed {deleted} cache entries from {}", cache.dir().display());
                }
            }
        }
    }
    Ok(())
}
