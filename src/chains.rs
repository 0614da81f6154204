//! Reply-chain reconstruction.
//!
//! A conversation arrives as a flat list of tweets. This module links them
//! through their `replied_to` references, picks the roots, and walks every
//! root-to-leaf path. Each path of two or more tweets is one [`Chain`].

use std::collections::{HashMap, HashSet};

use log::{debug, warn};
use serde_json::Value;

use crate::error::ChainError;
use crate::model::Tweet;

/// Root-to-leaf sequence of tweets, each replying to the one before it.
#[derive(Debug, Clone, PartialEq)]
pub struct Chain {
    tweets: Vec<Tweet>,
}

impl Chain {
    pub fn tweets(&self) -> &[Tweet] {
        &self.tweets
    }

    pub fn len(&self) -> usize {
        self.tweets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tweets.is_empty()
    }

    pub fn ids(&self) -> Vec<&str> {
        self.tweets.iter().map(|t| t.id.as_str()).collect()
    }

    /// JSON array of the full tweet objects with sorted keys.
    pub fn to_json_line(&self) -> serde_json::Result<String> {
        let values = self
            .tweets
            .iter()
            .map(serde_json::to_value)
            .collect::<serde_json::Result<Vec<Value>>>()?;
        serde_json::to_string(&values)
    }

    /// Texts joined by tabs, with tabs and newlines inside a text flattened.
    pub fn to_text_line(&self) -> String {
        self.tweets
            .iter()
            .map(Tweet::flat_text)
            .collect::<Vec<_>>()
            .join("\t")
    }
}

/// Reply edges between the tweets of one conversation.
///
/// Built once per conversation and dropped after the chains are collected.
#[derive(Debug, Default)]
pub struct ReplyGraph<'a> {
    /// Retained tweets in input order.
    order: Vec<&'a str>,
    tweets: HashMap<&'a str, &'a Tweet>,
    repliers_of: HashMap<&'a str, Vec<&'a str>>,
    reply_target_of: HashMap<&'a str, Vec<&'a str>>,
}

impl<'a> ReplyGraph<'a> {
    /// Links the tweets, leaving self-replies out entirely.
    ///
    /// When an id shows up twice, the first record is kept.
    pub fn new(tweets: &'a [Tweet]) -> Self {
        let mut graph = ReplyGraph::default();
        for tweet in tweets {
            if tweet.is_self_reply() {
                debug!(" skip self-reply {}", tweet.id);
                continue;
            }
            let id = tweet.id.as_str();
            if graph.tweets.contains_key(id) {
                debug!(" skip duplicate tweet {}", id);
                continue;
            }
            graph.order.push(id);
            graph.tweets.insert(id, tweet);
            for target in tweet.reply_target_ids() {
                graph.repliers_of.entry(target).or_default().push(id);
                graph.reply_target_of.entry(id).or_default().push(target);
            }
        }
        graph
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn repliers(&self, id: &str) -> &[&'a str] {
        self.repliers_of.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Tweets that reply to nothing.
    ///
    /// If every tweet replies to something, the real root was not fetched.
    /// Then any tweet whose reply targets are all missing from the graph
    /// stands in as a root. Several such tweets may qualify; all are kept.
    pub fn roots(&self) -> Vec<&'a str> {
        let primary: Vec<&'a str> = self
            .order
            .iter()
            .copied()
            .filter(|id| !self.reply_target_of.contains_key(id))
            .collect();
        if !primary.is_empty() {
            return primary;
        }

        debug!(" root tweet is not found, searching for tweets with no known reply target");
        self.order
            .iter()
            .copied()
            .filter(|id| {
                self.reply_target_of
                    .get(id)
                    .map(|targets| !targets.iter().any(|t| self.tweets.contains_key(t)))
                    .unwrap_or(false)
            })
            .collect()
    }

    /// Every root-to-leaf path starting at `root`, singletons included.
    ///
    /// Depth-first with an explicit stack; each frame carries its own path.
    /// Fails when a tweet reappears on its own path.
    pub fn paths_from(&self, root: &'a str) -> Result<Vec<Vec<&'a str>>, ChainError> {
        let mut complete = Vec::new();
        let mut stack: Vec<Vec<&'a str>> = vec![vec![root]];

        while let Some(path) = stack.pop() {
            let last = path[path.len() - 1];
            let repliers = self.repliers(last);
            if repliers.is_empty() {
                complete.push(path);
                continue;
            }
            // reversed so the first replier is explored first
            for &replier in repliers.iter().rev() {
                if path.contains(&replier) {
                    return Err(ChainError::Cycle {
                        tweet_id: replier.to_string(),
                    });
                }
                let mut next = path.clone();
                next.push(replier);
                stack.push(next);
            }
        }
        Ok(complete)
    }

    /// All chains of two or more tweets, root by root.
    ///
    /// Tweets no root reaches are checked for reply cycles afterwards, so a
    /// conversation that is nothing but a loop is rejected too.
    pub fn chains(&self) -> Result<Vec<Chain>, ChainError> {
        let mut chains = Vec::new();
        let mut visited: HashSet<&'a str> = HashSet::new();
        for root in self.roots() {
            for path in self.paths_from(root)? {
                visited.extend(path.iter().copied());
                if path.len() < 2 {
                    continue;
                }
                let tweets = path.iter().map(|id| self.tweets[id].clone()).collect();
                chains.push(Chain { tweets });
            }
        }
        if let Some(tweet_id) = self.unreached_cycle(&visited) {
            return Err(ChainError::Cycle {
                tweet_id: tweet_id.to_string(),
            });
        }
        Ok(chains)
    }

    /// First tweet found on a reply cycle among the tweets not in `visited`.
    ///
    /// Follows reply-target edges depth-first. Targets outside the graph
    /// and tweets already cleared end a walk.
    fn unreached_cycle(&self, visited: &HashSet<&'a str>) -> Option<&'a str> {
        let mut cleared: HashSet<&'a str> = visited.clone();
        for &start in &self.order {
            if cleared.contains(start) {
                continue;
            }
            let mut on_path: HashSet<&'a str> = HashSet::from([start]);
            let mut stack: Vec<(&'a str, usize)> = vec![(start, 0)];

            while let Some(top) = stack.last_mut() {
                let (id, next) = *top;
                top.1 += 1;
                let targets = self.reply_target_of.get(id).map(Vec::as_slice).unwrap_or(&[]);
                match targets.get(next) {
                    Some(&target) => {
                        if !self.tweets.contains_key(target) || cleared.contains(target) {
                            continue;
                        }
                        if !on_path.insert(target) {
                            return Some(target);
                        }
                        stack.push((target, 0));
                    }
                    None => {
                        on_path.remove(id);
                        cleared.insert(id);
                        stack.pop();
                    }
                }
            }
        }
        None
    }
}

/// Reconstructs the reply chains of one conversation.
///
/// An empty or single-tweet conversation yields no chains. A reply cycle
/// is rejected as invalid input.
pub fn build_chains(tweets: &[Tweet]) -> Result<Vec<Chain>, ChainError> {
    let graph = ReplyGraph::new(tweets);
    let chains = graph.chains();
    if let Err(e) = &chains {
        warn!("Rejecting conversation of {} tweets: {}", tweets.len(), e);
    }
    chains
}

/// Length histogram and coverage of the chains of one conversation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChainStats {
    pub lengths: Vec<usize>,
    pub unique_tweets: usize,
}

impl ChainStats {
    pub fn from_chains(chains: &[Chain]) -> Self {
        let unique: HashSet<&str> = chains
            .iter()
            .flat_map(|c| c.tweets.iter().map(|t| t.id.as_str()))
            .collect();
        ChainStats {
            lengths: chains.iter().map(Chain::len).collect(),
            unique_tweets: unique.len(),
        }
    }
}
