//! Recent-search requests for reply batches and whole conversations.
//!
//! This module builds the v2 search URLs and wraps them in a
//! [`TwitterClient`] that implements [`ConversationSource`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{debug, info};
use reqwest::Client;

use crate::model::ConversationPage;

use super::api::get_authenticated;
use super::ConversationSource;

const SEARCH_RECENT_URL: &str = "https://api.twitter.com/2/tweets/search/recent";

/// The search API rejects an empty query, so reply searches start by
/// excluding a phrase that matches nothing.
const GARBAGE_STRING: &str = "\"jdsoavndksaofjdsfadsakfjo\"";

const TWEET_FIELDS: &str = "author_id,conversation_id,in_reply_to_user_id,possibly_sensitive,created_at,entities,lang,referenced_tweets,reply_settings,source,context_annotations,withheld";
const USER_FIELDS: &str =
    "created_at,public_metrics,description,username,name,id,protected,withheld";
const EXPANSIONS: &str =
    "author_id,in_reply_to_user_id,referenced_tweets.id,referenced_tweets.id.author_id";

/// Page size of the reply search.
pub const REPLY_SEARCH_MAX_RESULTS: u32 = 20;
/// Page size of a conversation fetch.
pub const CONVERSATION_MAX_RESULTS: u32 = 10;

/// Phatic Japanese phrases (greetings, thanks, cheering) excluded from
/// reply searches; they rarely start a real exchange.
const JA_NEGATIONS: &[&str] = &[
    "おは",
    "おはよ",
    "おはよう",
    "あり",
    "がんば",
    "頑張り",
    "頑張れ",
    "頑張って",
    "おめでとう",
    "ありがとう",
    "誕生日",
    "いってら",
    "おやすみ",
    "お休み",
    "おつ",
    "おつかれ",
    "お疲れ",
    "ござい",
    "こんに",
    "こんば",
    "よろしく",
];

/// Formats a window bound the way the search API expects it.
pub fn format_search_time(time: &DateTime<Utc>) -> String {
    time.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

/// Builds the query that finds plain-text replies in `lang`.
///
/// The negations are best effort on the API side; quotes, hashtags,
/// media and links are excluded outright.
pub fn reply_search_query(lang: &str) -> String {
    let negations = if lang == "ja" {
        JA_NEGATIONS
            .iter()
            .map(|q| format!("-\"{}\"", q))
            .collect::<Vec<_>>()
            .join(" ")
    } else {
        String::new()
    };
    format!(
        "-{} {} is:reply lang:{} -is:quote -has:hashtags -has:media -has:links",
        GARBAGE_STRING, negations, lang
    )
}

fn search_url(query: &str, max_results: u32) -> String {
    format!(
        "{}?query={}&expansions={}&tweet.fields={}&user.fields={}&max_results={}",
        SEARCH_RECENT_URL,
        urlencoding::encode(query),
        EXPANSIONS,
        TWEET_FIELDS,
        USER_FIELDS,
        max_results
    )
}

/// URL for replies posted in `[start_time, end_time)`.
pub fn reply_search_url(lang: &str, start_time: &DateTime<Utc>, end_time: &DateTime<Utc>) -> String {
    format!(
        "{}&start_time={}&end_time={}",
        search_url(&reply_search_query(lang), REPLY_SEARCH_MAX_RESULTS),
        format_search_time(start_time),
        format_search_time(end_time)
    )
}

/// URL for the tweets of one conversation.
///
/// The root itself is not a match for `conversation_id:`, but the
/// `referenced_tweets.id` expansion returns it in `includes.tweets`.
pub fn conversation_url(conversation_id: &str) -> String {
    search_url(
        &format!("conversation_id:{}", conversation_id),
        CONVERSATION_MAX_RESULTS,
    )
}

/// Recent-search client authenticated with an app-only bearer token.
pub struct TwitterClient {
    client: Client,
    bearer_token: String,
    lang: String,
}

impl TwitterClient {
    pub fn new(bearer_token: impl Into<String>, lang: impl Into<String>) -> Self {
        TwitterClient {
            client: Client::new(),
            bearer_token: bearer_token.into(),
            lang: lang.into(),
        }
    }

    async fn fetch_page(
        &self,
        url: &str,
        operation_name: &str,
    ) -> Result<ConversationPage, Box<dyn std::error::Error + Send + Sync>> {
        let response_text =
            get_authenticated(&self.client, &self.bearer_token, url, operation_name).await?;
        let page: ConversationPage = serde_json::from_str(&response_text)?;
        debug!(
            "Operation '{}' returned {} tweets and {} users",
            operation_name,
            page.tweets().len(),
            page.users().len()
        );
        Ok(page)
    }
}

#[async_trait]
impl ConversationSource for TwitterClient {
    async fn search_replies(
        &self,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> Result<ConversationPage, Box<dyn std::error::Error + Send + Sync>> {
        info!(
            "search: {} TO {}",
            format_search_time(&start_time),
            format_search_time(&end_time)
        );
        let url = reply_search_url(&self.lang, &start_time, &end_time);
        self.fetch_page(&url, "search_replies").await
    }

    async fn fetch_conversation(
        &self,
        conversation_id: &str,
    ) -> Result<ConversationPage, Box<dyn std::error::Error + Send + Sync>> {
        let url = conversation_url(conversation_id);
        self.fetch_page(&url, &format!("fetch_conversation_{}", conversation_id))
            .await
    }
}
