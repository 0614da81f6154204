//! Admissibility filters for replies, users and fetched conversations.
//!
//! Every predicate here is total: a field the decision needs but the record
//! lacks counts as a reason to reject, never as an error.

use std::collections::HashSet;

use log::debug;

use crate::model::{ConversationPage, Tweet, User};

/// Replies carrying this many mentions or more are multi-party threads.
pub const MAX_MENTIONS: usize = 4;
/// Stripped text with this many distinct characters or fewer is too short.
pub const MIN_DISTINCT_CHARS: usize = 10;
/// Reply targets with this many followers or more are celebrity accounts.
pub const CELEBRITY_FOLLOWERS: u64 = 5000;
/// Reply targets at or below this follower or following count look like bots.
pub const LOW_SIGNAL_COUNT: u64 = 5;
/// Conversations with this many distinct users or more are skipped.
pub const MAX_CONVERSATION_USERS: usize = 7;

/// Removes mention and url spans from the tweet text.
///
/// Spans are applied from the highest start offset down, so removing one
/// never shifts a span still to be processed. Offsets are in characters.
/// Each removal also drops the character right after the span, which is
/// the separating space: `"@someuser hello"` becomes `"hello"`.
pub fn strip_noisy_entities(tweet: &Tweet) -> String {
    let entities = match &tweet.entities {
        Some(entities) => entities,
        None => return tweet.text.clone(),
    };

    let mut spans: Vec<(usize, usize)> = entities
        .mentions
        .iter()
        .chain(entities.urls.iter())
        .flatten()
        .map(|span| (span.start, span.end))
        .collect();
    spans.sort_by(|a, b| b.0.cmp(&a.0));

    let mut chars: Vec<char> = tweet.text.chars().collect();
    for (start, end) in spans {
        let start = start.min(chars.len());
        let stop = end.saturating_add(1).clamp(start, chars.len());
        chars.drain(start..stop);
    }
    chars.into_iter().collect()
}

/// Returns true when a reply should not be expanded into its conversation.
///
/// `users` is the `includes.users` list of the response the tweet came
/// from; the reply target has to be among them to be judged.
pub fn is_bad_element(tweet: &Tweet, users: &[User]) -> bool {
    if tweet.has_urls() {
        debug!(" url tweet");
        return true;
    }
    if tweet.is_possibly_sensitive() {
        debug!(" possibly sensitive");
        return true;
    }
    let mentions = tweet.mentions().len();
    if mentions >= MAX_MENTIONS {
        debug!(" too many mentions ({})", mentions);
        return true;
    }
    if tweet.is_self_reply() {
        debug!(" self-reply");
        return true;
    }
    let distinct: HashSet<char> = strip_noisy_entities(tweet).chars().collect();
    if distinct.len() <= MIN_DISTINCT_CHARS {
        debug!(" too short text ({} distinct chars)", distinct.len());
        return true;
    }

    let target_id = match tweet.in_reply_to_user_id.as_deref() {
        Some(id) => id,
        None => {
            debug!(" no reply target user");
            return true;
        }
    };
    match users.iter().find(|u| u.id == target_id) {
        Some(target) => is_bad_user(target),
        None => {
            debug!(" reply target {} not in included users", target_id);
            true
        }
    }
}

/// Returns true when replies to this user should be skipped.
pub fn is_bad_user(user: &User) -> bool {
    match user.protected {
        Some(false) => {}
        Some(true) => {
            debug!(" private account {}", user.id);
            return true;
        }
        None => {
            debug!(" unknown protection for {}", user.id);
            return true;
        }
    }

    let metrics = match &user.public_metrics {
        Some(metrics) => metrics,
        None => {
            debug!(" no public metrics for {}", user.id);
            return true;
        }
    };
    if metrics.followers_count >= CELEBRITY_FOLLOWERS {
        debug!(" high followers count ({})", metrics.followers_count);
        return true;
    }
    if metrics.following_count <= LOW_SIGNAL_COUNT || metrics.followers_count <= LOW_SIGNAL_COUNT {
        debug!(
            " low follower or following counts ({}/{})",
            metrics.followers_count, metrics.following_count
        );
        return true;
    }
    false
}

/// Returns true when a fetched conversation is not worth reconstructing.
///
/// Meant to run right after the conversation fetch: an empty or single
/// tweet result usually means the fetch itself came back short.
pub fn is_bad_conversation(page: &ConversationPage) -> bool {
    let tweets = page.tweets();
    if tweets.len() <= 1 {
        debug!(" no data or a single tweet ({})", tweets.len());
        return true;
    }

    let users = match page.includes.as_ref().and_then(|i| i.users.as_ref()) {
        Some(users) => users,
        None => {
            debug!(" no included users");
            return true;
        }
    };
    let user_ids: HashSet<&str> = users.iter().map(|u| u.id.as_str()).collect();
    if user_ids.len() >= MAX_CONVERSATION_USERS {
        debug!(" too many participants ({})", user_ids.len());
        return true;
    }

    let targets: HashSet<Option<&str>> = tweets
        .iter()
        .map(|t| t.in_reply_to_user_id.as_deref())
        .collect();
    if user_ids.len() == 1 || targets.len() == 1 {
        debug!(
            " single participant or single reply target ({} users, {} targets)",
            user_ids.len(),
            targets.len()
        );
        return true;
    }
    false
}
