//! # Tests Module
//!
//! End-to-end tests across the filters, the chain builder and the
//! collector/extractor pipeline. Unit tests live next to each module.

use crate::{
    build_chains, extract, is_bad_conversation, is_bad_element, Chain, Collector,
    CollectorConfig, ConversationPage, ConversationSource, OutputFormat, Tweet,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use std::collections::HashSet;

fn tweets(value: Value) -> Vec<Tweet> {
    serde_json::from_value(value).unwrap()
}

fn chain_ids(chains: &[Chain]) -> HashSet<Vec<String>> {
    chains
        .iter()
        .map(|c| c.ids().into_iter().map(str::to_string).collect())
        .collect()
}

/// A realistic conversation page: root in data, a branching reply tree,
/// a self-reply and entity spans that must survive re-serialization.
fn sample_conversation() -> Value {
    json!({
        "data": [
            {"id": "100", "author_id": "u1", "conversation_id": "100", "text": "Anyone tried the new ramen place downtown?",
             "possibly_sensitive": false, "lang": "en"},
            {"id": "101", "author_id": "u2", "in_reply_to_user_id": "u1", "conversation_id": "100",
             "text": "@alice yes! the broth is amazing", "possibly_sensitive": false,
             "entities": {"mentions": [{"start": 0, "end": 6, "username": "alice", "id": "u1"}]},
             "referenced_tweets": [{"type": "replied_to", "id": "100"}]},
            {"id": "102", "author_id": "u1", "in_reply_to_user_id": "u2", "conversation_id": "100",
             "text": "@bob going tonight then", "possibly_sensitive": false,
             "referenced_tweets": [{"type": "replied_to", "id": "101"}]},
            {"id": "103", "author_id": "u3", "in_reply_to_user_id": "u1", "conversation_id": "100",
             "text": "@alice too salty for me", "possibly_sensitive": false,
             "referenced_tweets": [{"type": "replied_to", "id": "100"}]},
            {"id": "104", "author_id": "u3", "in_reply_to_user_id": "u3", "conversation_id": "100",
             "text": "also the line was long", "possibly_sensitive": false,
             "referenced_tweets": [{"type": "replied_to", "id": "103"}]}
        ],
        "includes": {"users": [
            {"id": "u1", "protected": false, "public_metrics": {"followers_count": 210, "following_count": 180}},
            {"id": "u2", "protected": false, "public_metrics": {"followers_count": 95, "following_count": 300}},
            {"id": "u3", "protected": false, "public_metrics": {"followers_count": 40, "following_count": 41}}
        ]}
    })
}

/// Tests reconstruction over a branching conversation with a self-reply.
///
/// Verifies that:
/// - every root-to-leaf path of length two or more becomes a chain
/// - the self-reply never shows up
#[test]
fn test_branching_conversation_chains() {
    let page: ConversationPage = serde_json::from_value(sample_conversation()).unwrap();
    let chains = build_chains(page.tweets()).unwrap();

    let expected: HashSet<Vec<String>> = [vec!["100", "101", "102"], vec!["100", "103"]]
        .iter()
        .map(|c| c.iter().map(|s| s.to_string()).collect())
        .collect();
    assert_eq!(chain_ids(&chains), expected);
    assert!(chains
        .iter()
        .all(|c| c.tweets().iter().all(|t| !t.is_self_reply())));
}

/// Tests that the fallback root is used when the origin tweet was not fetched.
#[test]
fn test_missing_origin_falls_back_to_orphan_reply() {
    let tweets = tweets(json!([
        {"id": "201", "author_id": "u2", "in_reply_to_user_id": "u1", "text": "first",
         "referenced_tweets": [{"type": "replied_to", "id": "200"}]},
        {"id": "202", "author_id": "u1", "in_reply_to_user_id": "u2", "text": "second",
         "referenced_tweets": [{"type": "replied_to", "id": "201"}]},
        {"id": "203", "author_id": "u2", "in_reply_to_user_id": "u1", "text": "third",
         "referenced_tweets": [{"type": "replied_to", "id": "202"}]}
    ]));
    let chains = build_chains(&tweets).unwrap();
    assert_eq!(chains.len(), 1);
    assert_eq!(chains[0].ids(), vec!["201", "202", "203"]);
}

/// Tests that chain count matches the number of leaves below each root.
#[test]
fn test_chain_count_equals_leaf_paths() {
    // 1 -> {2, 3}, 2 -> {4, 5}, 3 -> {6}
    let tweets = tweets(json!([
        {"id": "1", "author_id": "a", "text": "r"},
        {"id": "2", "author_id": "b", "in_reply_to_user_id": "a", "text": "x", "referenced_tweets": [{"type": "replied_to", "id": "1"}]},
        {"id": "3", "author_id": "c", "in_reply_to_user_id": "a", "text": "x", "referenced_tweets": [{"type": "replied_to", "id": "1"}]},
        {"id": "4", "author_id": "a", "in_reply_to_user_id": "b", "text": "x", "referenced_tweets": [{"type": "replied_to", "id": "2"}]},
        {"id": "5", "author_id": "c", "in_reply_to_user_id": "b", "text": "x", "referenced_tweets": [{"type": "replied_to", "id": "2"}]},
        {"id": "6", "author_id": "b", "in_reply_to_user_id": "c", "text": "x", "referenced_tweets": [{"type": "replied_to", "id": "3"}]}
    ]));
    let chains = build_chains(&tweets).unwrap();
    assert_eq!(chains.len(), 3);
    assert_eq!(
        chains.iter().map(Chain::len).collect::<Vec<_>>(),
        vec![3, 3, 3]
    );
}

/// Tests the filters against the sample conversation.
#[test]
fn test_filters_on_sample_conversation() {
    let page: ConversationPage = serde_json::from_value(sample_conversation()).unwrap();
    assert!(!is_bad_conversation(&page));

    let reply = &page.tweets()[1];
    assert!(!is_bad_element(reply, page.users()));

    // The self-reply is pruned at the element level too
    let own = &page.tweets()[4];
    assert!(is_bad_element(own, page.users()));
}

/// Tests the text output of a two-tweet chain.
#[test]
fn test_text_only_output_line() {
    let input = json!({"data": [
        {"id": "1", "author_id": "a", "text": "Hello"},
        {"id": "2", "author_id": "b", "in_reply_to_user_id": "a", "text": "Hi\tthere",
         "referenced_tweets": [{"type": "replied_to", "id": "1"}]}
    ]})
    .to_string();

    let mut out = Vec::new();
    extract(input.as_bytes(), &mut out, OutputFormat::Text).unwrap();
    assert_eq!(String::from_utf8(out).unwrap(), "Hello\tHi there\n");
}

struct SingleConversation(ConversationPage);

#[async_trait]
impl ConversationSource for SingleConversation {
    async fn search_replies(
        &self,
        _start_time: DateTime<Utc>,
        _end_time: DateTime<Utc>,
    ) -> Result<ConversationPage, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self.0.clone())
    }

    async fn fetch_conversation(
        &self,
        _conversation_id: &str,
    ) -> Result<ConversationPage, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self.0.clone())
    }
}

/// Tests the collector output piped into the extractor.
///
/// The conversation the collector writes must keep every field the
/// extractor needs, so chains come out the same as from the raw page.
#[test]
fn test_collect_then_extract_pipeline() {
    let page: ConversationPage = serde_json::from_value(sample_conversation()).unwrap();
    let batch = ConversationPage {
        data: Some(vec![page.tweets()[1].clone()]),
        includes: page.includes.clone(),
        ..ConversationPage::default()
    };

    let mut collector = Collector::new(
        SingleConversation(page.clone()),
        CollectorConfig::default(),
        Vec::new(),
    );
    let written = tokio_test::block_on(collector.process_batch(&batch)).unwrap();
    assert_eq!(written, 1);
    let collected = collector.into_output();

    let mut out = Vec::new();
    let summary = extract(collected.as_slice(), &mut out, OutputFormat::Json).unwrap();
    assert_eq!(summary.chains, 2);

    let lines: Vec<Vec<Value>> = String::from_utf8(out)
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    // Full records survive, including keys the crate never reads
    assert_eq!(lines[0][0]["lang"], "en");
    assert_eq!(lines[0][1]["entities"]["mentions"][0]["username"], "alice");
}
