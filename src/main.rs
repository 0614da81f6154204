//! # Replychains
//!
//! Command line front end for collecting reply conversations and turning
//! them into reply chains.
//!
//! ## Commands
//!
//! - `collect`: Polls the recent search endpoint and prints admissible
//!   conversations as JSON lines on stdout
//! - `extract`: Reads conversation JSON lines and prints one chain per line
//!
//! ## Environment Variables
//!
//! - `BEARER_TOKEN`: Twitter API Bearer Token (required by `collect`)
//! - `RUST_LOG`: Log level filter (defaults to `info`)

use std::fs::File;
use std::io::{self, BufReader};
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use log::{error, info};

use replychains::{extract, Collector, CollectorConfig, OutputFormat, TwitterClient};

#[derive(Parser)]
#[command(name = "replychains")]
#[command(about = "Collect reply conversations and reconstruct reply chains", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Poll the search API and print admissible conversations as JSON lines
    Collect,
    /// Read conversation JSON lines and print their reply chains
    Extract {
        /// Print tab-joined tweet texts instead of JSON arrays
        #[arg(long)]
        text_only: bool,

        /// Read conversations from this file instead of stdin
        #[arg(short, long)]
        input: Option<PathBuf>,
    },
}

/// Main entry point.
///
/// Logging goes to stderr through `env_logger`, so stdout carries only data
/// and can be piped from `collect` into `extract`.
///
/// # Example Usage
///
/// ```bash
/// BEARER_TOKEN=... replychains collect > conversations.jsonl
/// replychains extract --text-only < conversations.jsonl
/// RUST_LOG=debug replychains extract --input conversations.jsonl
/// ```
#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let result = match cli.command {
        Command::Collect => run_collect().await,
        Command::Extract { text_only, input } => run_extract(text_only, input),
    };

    if let Err(e) = result {
        error!("{}", e);
        std::process::exit(1);
    }
}

async fn run_collect() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let config = CollectorConfig::from_env()?;
    let client = TwitterClient::new(config.bearer_token.clone(), config.lang.clone());
    let stdout = io::stdout();

    let mut collector = Collector::new(client, config, stdout.lock());
    let summary = collector.run().await?;
    info!(
        "Collected {} conversations over {} windows ({} errors)",
        summary.conversations, summary.loops, summary.errors
    );
    Ok(())
}

fn run_extract(
    text_only: bool,
    input: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let format = if text_only {
        OutputFormat::Text
    } else {
        OutputFormat::Json
    };
    let stdout = io::stdout();
    let out = stdout.lock();

    let summary = match input {
        Some(path) => {
            info!("Reading conversations from {}", path.display());
            extract(BufReader::new(File::open(path)?), out, format)?
        }
        None => extract(io::stdin().lock(), out, format)?,
    };
    info!(
        "Extracted {} chains from {} conversations ({} rejected)",
        summary.chains, summary.conversations, summary.rejected
    );
    Ok(())
}
