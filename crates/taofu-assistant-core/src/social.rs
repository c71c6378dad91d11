//! Social platform interface
//!
//! The poller only talks to a platform through [`SocialClient`]; transports
//! (e.g. the Twitter API v2 client) implement it.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors reported by a social platform client
#[derive(Debug, Error)]
pub enum SocialError {
    /// Fetching mentions failed
    #[error("Fetch error: {0}")]
    Fetch(String),
    /// Posting a reply failed
    #[error("Post error: {0}")]
    Post(String),
    /// Credentials were rejected or the account could not be resolved
    #[error("Auth error: {0}")]
    Auth(String),
    /// Rate limit exceeded and the wait budget ran out
    #[error("Rate limit exceeded: {message} (wait: {wait_secs:?}s)")]
    RateLimit {
        /// Seconds until the limit resets, if the platform said so
        wait_secs: Option<u64>,
        /// Error message from the platform
        message: String,
    },
}

/// A post that mentions the bot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mention {
    /// Platform-assigned, stable identifier
    pub id: String,
    /// Platform id of the author
    pub author_id: String,
    /// Author's handle without the leading `@`
    pub author_handle: String,
    /// Raw post text, including the bot mention
    pub text: String,
    /// Creation time, when the platform provides it
    pub created_at: Option<DateTime<Utc>>,
}

/// One page of mentions as returned by the platform
#[derive(Debug, Clone, Default)]
pub struct MentionBatch {
    /// Mentions in platform order (typically newest first)
    pub mentions: Vec<Mention>,
    /// Newest id in the page, usable as `since` for the next fetch
    pub newest_id: Option<String>,
}

impl MentionBatch {
    /// Build a batch without a platform-reported newest id.
    #[must_use]
    pub fn from_mentions(mentions: Vec<Mention>) -> Self {
        Self {
            mentions,
            newest_id: None,
        }
    }
}

/// Platform a question came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Platform {
    /// Twitter / X mentions
    Twitter,
    /// Discord commands
    Discord,
    /// Anything else found in older logs
    #[serde(other)]
    Other,
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Twitter => write!(f, "Twitter"),
            Self::Discord => write!(f, "Discord"),
            Self::Other => write!(f, "Other"),
        }
    }
}

/// Interface for social platform clients
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SocialClient: Send + Sync {
    /// Fetch the latest mentions, optionally only those newer than `since_id`
    async fn fetch_mentions(&self, since_id: Option<String>) -> Result<MentionBatch, SocialError>;
    /// Reply to `parent_id`, returning the id of the new post
    async fn post_reply(&self, parent_id: &str, text: &str) -> Result<String, SocialError>;
    /// The bot's own handle without the leading `@`
    async fn self_handle(&self) -> Result<String, SocialError>;
}
