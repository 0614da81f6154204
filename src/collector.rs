//! Polling collector for reply conversations.
//!
//! This module walks a sliding time window over the recent search API,
//! gates every reply through the admissibility filters, fetches the whole
//! conversation of the survivors and writes each admissible conversation as
//! one JSON line.

use std::io::Write;

use chrono::{DateTime, Duration, Utc};
use log::{debug, info, warn};
use tokio::time::{sleep, Instant};

use crate::config::CollectorConfig;
use crate::filter::{is_bad_conversation, is_bad_element};
use crate::model::ConversationPage;
use crate::twitter::{sanitize_for_logging, ConversationSource};

/// Counters reported when the polling loop stops.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectorSummary {
    pub loops: u64,
    pub errors: u64,
    pub conversations: u64,
}

/// Drives a [`ConversationSource`] and writes conversations to `out`.
pub struct Collector<S, W> {
    source: S,
    config: CollectorConfig,
    out: W,
}

impl<S, W> Collector<S, W>
where
    S: ConversationSource,
    W: Write,
{
    pub fn new(source: S, config: CollectorConfig, out: W) -> Self {
        Collector {
            source,
            config,
            out,
        }
    }

    pub fn into_output(self) -> W {
        self.out
    }

    /// Expands the admissible replies of one search batch.
    ///
    /// Replies without a conversation id or failing [`is_bad_element`] are
    /// skipped before any request is made; fetched conversations failing
    /// [`is_bad_conversation`] are dropped. A failed fetch aborts the batch.
    ///
    /// # Returns
    ///
    /// - `Ok(usize)`: Number of conversations written
    /// - `Err(Box<dyn std::error::Error + Send + Sync>)`: If a fetch or a write fails
    pub async fn process_batch(
        &mut self,
        batch: &ConversationPage,
    ) -> Result<usize, Box<dyn std::error::Error + Send + Sync>> {
        let users = batch.users();
        let mut written = 0;

        for tweet in batch.tweets() {
            let conversation_id = match tweet.conversation_id.as_deref() {
                Some(id) => id,
                None => {
                    warn!("Tweet {} has no conversation_id, skipping", tweet.id);
                    continue;
                }
            };
            info!("process {}", conversation_id);
            debug!(" text: {}", sanitize_for_logging(&tweet.text, 280));

            if is_bad_element(tweet, users) {
                info!(" skip conversation {} as pruning", conversation_id);
                continue;
            }

            let mut conversation = self.source.fetch_conversation(conversation_id).await?;
            if is_bad_conversation(&conversation) {
                info!(" skip conversation {} as filtering", conversation_id);
                continue;
            }

            match conversation.promote_root(conversation_id) {
                Ok(true) => debug!(" root tweet {} merged into data", conversation_id),
                Ok(false) => debug!(" root tweet {} not included", conversation_id),
                Err(e) => warn!(" malformed root tweet {}: {}", conversation_id, e),
            }

            info!(" print conversation {}", conversation_id);
            writeln!(self.out, "{}", conversation.to_sorted_json()?)?;
            self.out.flush()?;
            written += 1;
        }

        Ok(written)
    }

    /// Searches one window and expands what it finds.
    pub async fn collect_window(
        &mut self,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> Result<usize, Box<dyn std::error::Error + Send + Sync>> {
        let batch = self.source.search_replies(start_time, end_time).await?;
        info!("Found {} replies in window", batch.tweets().len());
        self.process_batch(&batch).await
    }

    /// Runs the polling loop until one of the configured limits is hit.
    ///
    /// The first window starts `search_offset` before now. Each iteration
    /// advances the window by `period` whether or not it succeeded, then
    /// sleeps for `period`; a failed iteration sleeps `error_sleep` first.
    pub async fn run(&mut self) -> Result<CollectorSummary, Box<dyn std::error::Error + Send + Sync>> {
        let period = self.config.period;
        let period_sleep = period.to_std()?;
        let error_sleep = self.config.error_sleep.to_std()?;
        let time_limit = self.config.time_limit.to_std()?;

        let mut summary = CollectorSummary::default();
        let mut start_time = Utc::now() - self.config.search_offset;
        let launched = Instant::now();

        while summary.loops < self.config.loop_limit
            && summary.errors < self.config.error_limit
            && launched.elapsed() < time_limit
        {
            let end_time = start_time + period;
            match self.collect_window(start_time, end_time).await {
                Ok(written) => summary.conversations += written as u64,
                Err(e) => {
                    warn!("failed {}", e);
                    info!("sleep: {} sec", error_sleep.as_secs());
                    summary.errors += 1;
                    sleep(error_sleep).await;
                }
            }
            start_time = end_time;
            summary.loops += 1;

            info!(
                "limit: (loop {}/{}) (error {}/{}) (time days {}/{})",
                summary.loops,
                self.config.loop_limit,
                summary.errors,
                self.config.error_limit,
                Duration::from_std(launched.elapsed())
                    .map(|d| d.num_days())
                    .unwrap_or_default(),
                self.config.time_limit.num_days()
            );
            info!("sleep: {} sec", period_sleep.as_secs());
            sleep(period_sleep).await;
        }

        info!(
            "Collector stopped after {} windows, {} errors, {} conversations",
            summary.loops, summary.errors, summary.conversations
        );
        Ok(summary)
    }
}
