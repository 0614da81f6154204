//! Conversation lines in, reply chains out.
//!
//! Reads one conversation JSON object per line (the collector's output),
//! reconstructs its chains and writes one line per chain.

use std::io::{BufRead, Write};

use log::{debug, info, warn};

use crate::chains::{build_chains, Chain, ChainStats};
use crate::error::ChainError;
use crate::model::ConversationPage;
use crate::twitter::sanitize_for_logging;

/// How each chain is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// JSON array of the full tweet objects, keys sorted
    #[default]
    Json,
    /// Tweet texts joined by tabs
    Text,
}

impl OutputFormat {
    pub fn render(&self, chain: &Chain) -> serde_json::Result<String> {
        match self {
            OutputFormat::Json => chain.to_json_line(),
            OutputFormat::Text => Ok(chain.to_text_line()),
        }
    }
}

/// Totals over one extraction run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractSummary {
    pub conversations: usize,
    pub rejected: usize,
    pub chains: usize,
}

/// Parses one conversation line and reconstructs its chains.
///
/// A tweet missing `id`, `author_id` or `text` fails the whole line.
pub fn chains_from_line(line: &str) -> Result<Vec<Chain>, ChainError> {
    let page: ConversationPage = serde_json::from_str(line)?;
    let tweets = page.tweets();
    info!(
        "process: {}, {} tweets",
        tweets
            .first()
            .and_then(|t| t.conversation_id.as_deref())
            .unwrap_or("unknown"),
        tweets.len()
    );
    for tweet in tweets {
        debug!(
            " ({} -> {}) tweet: {}",
            tweet.author_id,
            tweet.in_reply_to_user_id.as_deref().unwrap_or("NONE"),
            sanitize_for_logging(&tweet.text, 280)
        );
    }
    build_chains(tweets)
}

/// Extracts chains from every line of `reader` into `writer`.
///
/// Lines that fail to parse or to reconstruct are logged and skipped; the
/// remaining lines are still processed. Only I/O failures abort the run.
pub fn extract<R, W>(
    reader: R,
    mut writer: W,
    format: OutputFormat,
) -> Result<ExtractSummary, Box<dyn std::error::Error + Send + Sync>>
where
    R: BufRead,
    W: Write,
{
    let mut summary = ExtractSummary::default();

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        summary.conversations += 1;

        let chains = match chains_from_line(line) {
            Ok(chains) => chains,
            Err(e) => {
                warn!("Skipping line {}: {}", index + 1, e);
                summary.rejected += 1;
                continue;
            }
        };

        for chain in &chains {
            debug!(" -------chain-start");
            writeln!(writer, "{}", format.render(chain)?)?;
            for tweet in chain.tweets() {
                debug!("  {}", sanitize_for_logging(&tweet.text, 280));
            }
            debug!(" =======end========");
        }

        let stats = ChainStats::from_chains(&chains);
        info!(" print chains of lengths {:?}", stats.lengths);
        info!(" unique tweets {}", stats.unique_tweets);
        summary.chains += chains.len();
    }

    writer.flush()?;
    Ok(summary)
}
