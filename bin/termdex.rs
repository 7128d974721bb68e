use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use termdex::{
    EngineConfig, FileSystemWatcher, IndexingService, SearchResult, WatcherConfig, WordTokenizer,
};

const MAX_DISPLAYED_RESULTS: usize = 10;

#[derive(Parser)]
#[command(name = "termdex")]
#[command(about = "Live filesystem text indexing and search", long_about = None)]
struct Args {
    /// Path to the configuration file (index.directory / watch.directory keys)
    config: PathBuf,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();
    if let Err(e) = run(&args) {
        eprintln!("Failed to start termdex: {e:#}");
        std::process::exit(1);
    }
}

fn run(args: &Args) -> Result<()> {
    info!("Starting termdex v{}", termdex::VERSION);

    let config = EngineConfig::load(&args.config)
        .with_context(|| format!("loading configuration from {}", args.config.display()))?;

    let service = Arc::new(IndexingService::new(Box::new(WordTokenizer::default())));
    let mut watcher = FileSystemWatcher::new(Arc::clone(&service), WatcherConfig::default());

    println!("=== termdex ===");
    println!("Indexing directory: {}", config.index_directory().display());
    println!("Watching directory: {}", config.watch_directory().display());
    println!();

    let indexed = service.index_directory(config.index_directory());
    println!("Indexed {indexed} files");

    watcher
        .start(config.watch_directory(), false)
        .context("starting filesystem watcher")?;

    print_help();

    let stdin = io::stdin();
    loop {
        print!("search> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break; // EOF
        }
        let input = line.trim();

        match input {
            "" => continue,
            "quit" | "exit" => break,
            "help" => print_help(),
            "stats" => print_stats(&service)?,
            _ => {
                let terms: Vec<String> = input.split_whitespace().map(|s| s.to_string()).collect();
                print_results(&service.search_all(&terms));
            }
        }
    }

    watcher.stop();
    info!("termdex shut down cleanly");
    Ok(())
}

fn print_help() {
    println!("Enter one or more words to search (all must co-occur on a line).");
    println!("Commands: 'stats' for metrics, 'help' for this message, 'quit' or 'exit' to leave.");
}

fn print_stats(service: &IndexingService) -> Result<()> {
    let metrics = service.metrics();
    println!("{}", serde_json::to_string_pretty(&metrics)?);
    println!("{}", metrics.health_summary());
    println!(
        "{}",
        serde_json::to_string_pretty(&service.stats()).context("serializing index stats")?
    );
    Ok(())
}

fn print_results(results: &[SearchResult]) {
    if results.is_empty() {
        println!("No results.");
        return;
    }
    for result in results.iter().take(MAX_DISPLAYED_RESULTS) {
        println!("  {}:{}", result.path.display(), result.line);
    }
    if results.len() > MAX_DISPLAYED_RESULTS {
        println!("  ... and {} more", results.len() - MAX_DISPLAYED_RESULTS);
    }
}
