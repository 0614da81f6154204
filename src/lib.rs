//! # Replychains Library
//!
//! Collects reply conversations from the Twitter/X API v2 and reconstructs
//! them into ordered reply chains for dialogue and text-pair modeling.
//!
//! ## Features
//!
//! - Admissibility filters for replies, users and whole conversations
//! - Reply-graph reconstruction with root inference when the origin tweet is missing
//! - Enumeration of every root-to-leaf reply chain
//! - Polling collector over the recent search endpoint (Bearer Token authentication)
//! - JSON-lines extraction to full-tweet JSON arrays or tab-joined text
//! - Structured logging
//!
//! ## Configuration
//!
//! The collector reads its settings from the environment:
//! - `BEARER_TOKEN`: App-only Bearer Token (required)
//! - `SEARCH_LANG`: Language of the collected replies (defaults to `en`)
//!
//! See [`CollectorConfig::from_env`] for the pacing variables.

pub mod chains;
pub mod collector;
pub mod config;
pub mod error;
pub mod extract;
pub mod filter;
pub mod model;
pub mod twitter;

// Re-export commonly used types and functions
pub use chains::{build_chains, Chain, ChainStats, ReplyGraph};
pub use collector::{Collector, CollectorSummary};
pub use config::CollectorConfig;
pub use error::ChainError;
pub use extract::{extract, ExtractSummary, OutputFormat};
pub use filter::{is_bad_conversation, is_bad_element, is_bad_user};
pub use model::{ConversationPage, Tweet, User};
pub use twitter::{ConversationSource, TwitterClient};

#[cfg(test)]
mod tests;
