//! Twitter API v2 client implementing [`SocialClient`].
//!
//! Transient failures (network errors, 5xx) of reads are retried with
//! exponential backoff. Creating a tweet is only resent when the request
//! never reached the server. A 429 waits for the rate-limit window to reset,
//! capped by `twitter_rate_limit_max_wait_secs`, and then tries once more.

use crate::config::{
    TwitterSettings, TWITTER_API_INITIAL_BACKOFF_MS, TWITTER_API_MAX_BACKOFF_MS,
    TWITTER_API_MAX_RETRIES,
};
use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::HeaderMap;
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use taofu_assistant_core::social::{Mention, MentionBatch, SocialClient, SocialError};
use thiserror::Error;
use tokio::sync::OnceCell;
use tokio_retry::strategy::{jitter, ExponentialBackoff};
use tokio_retry::RetryIf;
use tracing::{debug, info, warn};

const RATE_LIMIT_RESET_HEADER: &str = "x-rate-limit-reset";

/// Failure of a single API exchange
#[derive(Debug, Error)]
enum ApiFailure {
    #[error("request failed: {0}")]
    Transient(String),
    #[error("rate limited: {message}")]
    RateLimited {
        wait_secs: Option<u64>,
        message: String,
    },
    #[error("HTTP {status}: {message}")]
    Rejected { status: StatusCode, message: String },
    #[error("unexpected response: {0}")]
    Decode(String),
    #[error("outcome unknown: {0}")]
    Unconfirmed(String),
}

impl ApiFailure {
    const fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_))
    }

    /// Map onto the platform error, `op` choosing the generic variant.
    fn into_social(self, op: fn(String) -> SocialError) -> SocialError {
        match self {
            Self::RateLimited { wait_secs, message } => {
                SocialError::RateLimit { wait_secs, message }
            }
            Self::Rejected { status, message }
                if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN =>
            {
                SocialError::Auth(format!("HTTP {status}: {message}"))
            }
            other => op(other.to_string()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct DataEnvelope<T> {
    data: T,
}

#[derive(Debug, Clone, Deserialize)]
struct UserData {
    id: String,
    username: String,
}

#[derive(Debug, Deserialize)]
struct TweetData {
    id: String,
    text: String,
    author_id: Option<String>,
    created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Default, Deserialize)]
struct Includes {
    #[serde(default)]
    users: Vec<UserData>,
}

#[derive(Debug, Default, Deserialize)]
struct PageMeta {
    newest_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MentionsPage {
    #[serde(default)]
    data: Vec<TweetData>,
    #[serde(default)]
    includes: Includes,
    #[serde(default)]
    meta: PageMeta,
}

impl MentionsPage {
    fn into_batch(self) -> MentionBatch {
        let handles: HashMap<String, String> = self
            .includes
            .users
            .into_iter()
            .map(|u| (u.id, u.username))
            .collect();

        let mentions = self
            .data
            .into_iter()
            .map(|tweet| {
                let author_id = tweet.author_id.unwrap_or_default();
                let author_handle = handles
                    .get(&author_id)
                    .cloned()
                    .unwrap_or_else(|| author_id.clone());
                Mention {
                    id: tweet.id,
                    author_id,
                    author_handle,
                    text: tweet.text,
                    created_at: tweet.created_at,
                }
            })
            .collect();

        MentionBatch {
            mentions,
            newest_id: self.meta.newest_id,
        }
    }
}

#[derive(Debug, Serialize)]
struct ReplyTo<'a> {
    in_reply_to_tweet_id: &'a str,
}

#[derive(Debug, Serialize)]
struct CreateTweet<'a> {
    text: &'a str,
    reply: ReplyTo<'a>,
}

#[derive(Debug, Deserialize)]
struct CreatedTweet {
    id: String,
}

/// When a failed request may be sent again
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Replay {
    /// Repeating the request has no side effects
    Always,
    /// The server may have acted on it; only resend if it never arrived
    Undelivered,
}

impl Replay {
    const fn allows(self, reached_server: bool) -> bool {
        match self {
            Self::Always => true,
            Self::Undelivered => !reached_server,
        }
    }
}

/// Seconds until the rate-limit window resets, from the epoch-seconds header.
fn reset_wait_secs(headers: &HeaderMap, now_epoch: i64) -> Option<u64> {
    let reset = headers
        .get(RATE_LIMIT_RESET_HEADER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<i64>()
        .ok()?;
    Some(u64::try_from(reset.saturating_sub(now_epoch)).unwrap_or(0))
}

/// Twitter API v2 client authenticated with a user-context bearer token
pub struct TwitterClient {
    http: reqwest::Client,
    base_url: String,
    bearer_token: String,
    page_size: u32,
    rate_limit_max_wait: Duration,
    max_retries: usize,
    me: OnceCell<UserData>,
}

impl TwitterClient {
    /// Create a client from transport settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(settings: &TwitterSettings) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(settings.http_timeout())
            .build()
            .context("Failed to build HTTP client for Twitter")?;

        Ok(Self {
            http,
            base_url: settings.api_base_url().to_string(),
            bearer_token: settings.twitter_bearer_token.clone(),
            page_size: settings.page_size(),
            rate_limit_max_wait: settings.rate_limit_max_wait(),
            max_retries: TWITTER_API_MAX_RETRIES,
            me: OnceCell::new(),
        })
    }

    /// Override how often transient failures are retried.
    #[must_use]
    pub fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries;
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn me(&self) -> Result<&UserData, SocialError> {
        self.me
            .get_or_try_init(|| async {
                let envelope: DataEnvelope<UserData> = self
                    .execute(Replay::Always, || self.http.get(self.url("/users/me")))
                    .await
                    .map_err(|e| e.into_social(SocialError::Fetch))?;
                info!(user_id = %envelope.data.id, "Authenticated as @{}", envelope.data.username);
                Ok::<_, SocialError>(envelope.data)
            })
            .await
    }

    /// Send a request with retries and rate-limit handling.
    async fn execute<T, F>(&self, replay: Replay, build: F) -> Result<T, ApiFailure>
    where
        T: DeserializeOwned,
        F: Fn() -> RequestBuilder,
    {
        match self.execute_with_retry(replay, &build).await {
            Err(ApiFailure::RateLimited { wait_secs, message }) => {
                let wait = Duration::from_secs(wait_secs.unwrap_or(0));
                if wait > self.rate_limit_max_wait {
                    warn!(wait_secs = wait.as_secs(), "Rate limit reset too far away, giving up");
                    return Err(ApiFailure::RateLimited { wait_secs, message });
                }
                warn!(wait_secs = wait.as_secs(), "Rate limit exceeded. Waiting for reset");
                tokio::time::sleep(wait).await;
                self.execute_with_retry(replay, &build).await
            }
            other => other,
        }
    }

    async fn execute_with_retry<T, F>(&self, replay: Replay, build: &F) -> Result<T, ApiFailure>
    where
        T: DeserializeOwned,
        F: Fn() -> RequestBuilder,
    {
        let retry_strategy = ExponentialBackoff::from_millis(TWITTER_API_INITIAL_BACKOFF_MS)
            .max_delay(Duration::from_millis(TWITTER_API_MAX_BACKOFF_MS))
            .map(jitter)
            .take(self.max_retries);

        RetryIf::spawn(
            retry_strategy,
            || self.send_once(replay, build()),
            ApiFailure::is_transient,
        )
        .await
        .inspect_err(|e| {
            if e.is_transient() {
                warn!(
                    "Twitter API operation failed after {} attempts: {}",
                    self.max_retries + 1,
                    e
                );
            }
        })
    }

    async fn send_once<T: DeserializeOwned>(
        &self,
        replay: Replay,
        request: RequestBuilder,
    ) -> Result<T, ApiFailure> {
        let response = request
            .bearer_auth(&self.bearer_token)
            .send()
            .await
            .map_err(|e| {
                if replay.allows(!e.is_connect()) {
                    ApiFailure::Transient(e.to_string())
                } else {
                    warn!("Request may have reached Twitter, not resending: {e}");
                    ApiFailure::Unconfirmed(e.to_string())
                }
            })?;

        let status = response.status();
        if status.is_success() {
            return response
                .json::<T>()
                .await
                .map_err(|e| ApiFailure::Decode(e.to_string()));
        }

        let wait_secs = reset_wait_secs(response.headers(), Utc::now().timestamp());
        let message = response.text().await.unwrap_or_default();
        debug!(%status, "Twitter API error response: {message}");

        if status == StatusCode::TOO_MANY_REQUESTS {
            Err(ApiFailure::RateLimited { wait_secs, message })
        } else if status.is_server_error() && replay.allows(true) {
            Err(ApiFailure::Transient(format!("HTTP {status}: {message}")))
        } else {
            Err(ApiFailure::Rejected { status, message })
        }
    }
}

#[async_trait]
impl SocialClient for TwitterClient {
    async fn fetch_mentions(&self, since_id: Option<String>) -> Result<MentionBatch, SocialError> {
        let me = self.me().await?;
        let url = self.url(&format!("/users/{}/mentions", me.id));
        let page_size = self.page_size.to_string();

        let page: MentionsPage = self
            .execute(Replay::Always, || {
                let mut query = vec![
                    ("max_results", page_size.as_str()),
                    ("expansions", "author_id"),
                    ("user.fields", "username"),
                    ("tweet.fields", "created_at,author_id"),
                ];
                if let Some(since) = since_id.as_deref() {
                    query.push(("since_id", since));
                }
                self.http.get(&url).query(&query)
            })
            .await
            .map_err(|e| e.into_social(SocialError::Fetch))?;

        let batch = page.into_batch();
        debug!(count = batch.mentions.len(), newest_id = ?batch.newest_id, "Fetched mentions");
        Ok(batch)
    }

    async fn post_reply(&self, parent_id: &str, text: &str) -> Result<String, SocialError> {
        let body = CreateTweet {
            text,
            reply: ReplyTo {
                in_reply_to_tweet_id: parent_id,
            },
        };

        let created: DataEnvelope<CreatedTweet> = self
            .execute(Replay::Undelivered, || {
                self.http.post(self.url("/tweets")).json(&body)
            })
            .await
            .map_err(|e| e.into_social(SocialError::Post))?;

        Ok(created.data.id)
    }

    async fn self_handle(&self) -> Result<String, SocialError> {
        Ok(self.me().await?.username.clone())
    }
}
