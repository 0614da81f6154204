//! Twitter/X API integration module.
//!
//! This module contains the recent-search client used by the collector and
//! the [`ConversationSource`] seam it is driven through.

mod api;
mod search;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::model::ConversationPage;

// Re-export public API
pub use api::build_bearer_auth_header;
pub use search::{
    conversation_url, format_search_time, reply_search_query, reply_search_url, TwitterClient,
};

// Crate-internal re-exports (used by the collector and extractor logging)
pub(crate) use api::sanitize_for_logging;

/// Where reply batches and conversations come from.
#[async_trait]
pub trait ConversationSource {
    /// Replies posted within `[start_time, end_time)`, with their users.
    async fn search_replies(
        &self,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> Result<ConversationPage, Box<dyn std::error::Error + Send + Sync>>;

    /// Every retrievable tweet of one conversation.
    async fn fetch_conversation(
        &self,
        conversation_id: &str,
    ) -> Result<ConversationPage, Box<dyn std::error::Error + Send + Sync>>;
}
