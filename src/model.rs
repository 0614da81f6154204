//! Twitter/X API v2 records consumed by the filters and the chain builder.
//!
//! Only the fields the crate reasons about are typed. Every other key of the
//! original JSON object is kept in a flattened `extra` map so that a record
//! re-serializes to the full object it was read from.

use std::fmt;
use std::ops::Deref;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Number, Value};

/// Reference type marking a reply edge in `referenced_tweets`.
pub const REPLIED_TO: &str = "replied_to";

/// Tweet or user id, accepted as a JSON string or a JSON integer.
///
/// The v2 API sends ids as strings, but older dumps carry plain integers.
/// Comparison goes by the textual form; serialization writes the id back
/// in the form it was read.
#[derive(Debug, Clone, Eq)]
pub struct Id {
    text: String,
    number: Option<Number>,
}

impl Id {
    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl Deref for Id {
    type Target = str;

    fn deref(&self) -> &str {
        &self.text
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl PartialEq for Id {
    fn eq(&self, other: &Id) -> bool {
        self.text == other.text
    }
}

impl PartialEq<str> for Id {
    fn eq(&self, other: &str) -> bool {
        self.text == other
    }
}

impl PartialEq<&str> for Id {
    fn eq(&self, other: &&str) -> bool {
        self.text == *other
    }
}

impl From<&str> for Id {
    fn from(text: &str) -> Self {
        Id {
            text: text.to_string(),
            number: None,
        }
    }
}

impl Serialize for Id {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match &self.number {
            Some(number) => number.serialize(serializer),
            None => serializer.serialize_str(&self.text),
        }
    }
}

impl<'de> Deserialize<'de> for Id {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Value::deserialize(deserializer)? {
            Value::String(text) => Ok(Id { text, number: None }),
            Value::Number(number) => Ok(Id {
                text: number.to_string(),
                number: Some(number),
            }),
            other => Err(serde::de::Error::custom(format!(
                "expected a string or integer id, got {}",
                other
            ))),
        }
    }
}

/// A `{type, id}` entry of a tweet's `referenced_tweets` list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferencedTweet {
    #[serde(rename = "type")]
    pub kind: String,
    pub id: Id,
}

impl ReferencedTweet {
    pub fn is_reply(&self) -> bool {
        self.kind == REPLIED_TO
    }
}

/// Character range of an entity inside the tweet text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitySpan {
    pub start: usize,
    pub end: usize,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The `entities` object of a tweet. Kinds other than mentions and urls
/// (hashtags, annotations, cashtags) stay in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Entities {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mentions: Option<Vec<EntitySpan>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub urls: Option<Vec<EntitySpan>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A single tweet as returned in `data` or `includes.tweets`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tweet {
    pub id: Id,
    pub author_id: Id,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub in_reply_to_user_id: Option<Id>,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<Id>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub referenced_tweets: Option<Vec<ReferencedTweet>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entities: Option<Entities>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub possibly_sensitive: Option<bool>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Tweet {
    /// True when the tweet answers its own author.
    pub fn is_self_reply(&self) -> bool {
        self.in_reply_to_user_id.as_deref() == Some(self.author_id.as_str())
    }

    /// Ids of the tweets this one replies to (`replied_to` references only).
    pub fn reply_target_ids(&self) -> impl Iterator<Item = &str> {
        self.referenced_tweets
            .iter()
            .flatten()
            .filter(|r| r.is_reply())
            .map(|r| r.id.as_str())
    }

    /// Absent flag reads as not sensitive.
    pub fn is_possibly_sensitive(&self) -> bool {
        self.possibly_sensitive.unwrap_or(false)
    }

    pub fn mentions(&self) -> &[EntitySpan] {
        self.entities
            .as_ref()
            .and_then(|e| e.mentions.as_deref())
            .unwrap_or(&[])
    }

    pub fn has_urls(&self) -> bool {
        self.entities
            .as_ref()
            .map(|e| e.urls.is_some())
            .unwrap_or(false)
    }

    /// Text with tabs and newlines flattened to single spaces.
    pub fn flat_text(&self) -> String {
        self.text.replace(['\n', '\t'], " ")
    }
}

/// Public counters attached to a user with `user.fields=public_metrics`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublicMetrics {
    pub followers_count: u64,
    pub following_count: u64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A user from `includes.users`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Id,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protected: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_metrics: Option<PublicMetrics>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The `includes` expansion block of a response.
///
/// Included tweets stay raw: they are only looked at to recover the
/// conversation root, and one odd referenced tweet must not fail the page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Includes {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub users: Option<Vec<User>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tweets: Option<Vec<Value>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One recent-search response: a batch of replies or a whole conversation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConversationPage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Vec<Tweet>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub includes: Option<Includes>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ConversationPage {
    pub fn tweets(&self) -> &[Tweet] {
        self.data.as_deref().unwrap_or(&[])
    }

    pub fn users(&self) -> &[User] {
        self.includes
            .as_ref()
            .and_then(|i| i.users.as_deref())
            .unwrap_or(&[])
    }

    /// Moves the conversation root from `includes.tweets` into `data`.
    ///
    /// The search endpoint only returns replies; the root comes back as an
    /// expansion of `referenced_tweets.id`. Included tweets are dropped
    /// afterwards either way. Returns true when the root was found.
    pub fn promote_root(&mut self, conversation_id: &str) -> serde_json::Result<bool> {
        let included = match self.includes.as_mut().and_then(|i| i.tweets.take()) {
            Some(tweets) => tweets,
            None => return Ok(false),
        };
        let root = included.into_iter().find(|tw| match tw.get("id") {
            Some(Value::String(id)) => id == conversation_id,
            Some(Value::Number(id)) => id.to_string() == conversation_id,
            _ => false,
        });
        match root {
            Some(root) => {
                let root: Tweet = serde_json::from_value(root)?;
                self.data.get_or_insert_with(Vec::new).push(root);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Serializes with object keys in sorted order.
    pub fn to_sorted_json(&self) -> serde_json::Result<String> {
        serde_json::to_value(self).and_then(|v| serde_json::to_string(&v))
    }
}
