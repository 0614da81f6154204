use thiserror::Error;

/// Reasons a single conversation cannot be turned into chains.
///
/// Each error is scoped to one conversation; callers log it and move on.
#[derive(Debug, Error)]
pub enum ChainError {
    #[error("Malformed conversation record: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Reply cycle detected at tweet {tweet_id}")]
    Cycle { tweet_id: String },
}
