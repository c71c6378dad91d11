//! Twitter transport settings.

use config::ConfigError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use taofu_assistant_core::config::AssistantSettings;

/// Default Twitter API v2 root
pub const DEFAULT_API_BASE_URL: &str = "https://api.twitter.com/2";
/// Mentions requested per fetch
pub const DEFAULT_MENTIONS_PAGE_SIZE: u32 = 20;
/// Bounds the API accepts for `max_results`
pub const MENTIONS_PAGE_SIZE_RANGE: (u32, u32) = (5, 100);
/// HTTP request timeout
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;
/// Longest wait for a rate-limit window to reset
pub const DEFAULT_RATE_LIMIT_MAX_WAIT_SECS: u64 = 900;

/// Maximum number of retries for transient API failures
pub const TWITTER_API_MAX_RETRIES: usize = 3;
/// Initial backoff for transient API failures (milliseconds)
pub const TWITTER_API_INITIAL_BACKOFF_MS: u64 = 100;
/// Backoff ceiling for transient API failures (milliseconds)
pub const TWITTER_API_MAX_BACKOFF_MS: u64 = 2_000;

/// Twitter transport settings loaded from environment variables.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct TwitterSettings {
    /// OAuth 2.0 user-context bearer token.
    pub twitter_bearer_token: String,
    /// API root, without a trailing slash.
    #[serde(default = "default_api_base_url")]
    pub twitter_api_base_url: String,
    /// Mentions requested per fetch (clamped to what the API accepts).
    #[serde(default = "default_mentions_page_size")]
    pub twitter_mentions_page_size: u32,
    /// HTTP request timeout in seconds.
    #[serde(default = "default_http_timeout_secs")]
    pub twitter_http_timeout_secs: u64,
    /// Longest rate-limit wait in seconds before giving up on a request.
    #[serde(default = "default_rate_limit_max_wait_secs")]
    pub twitter_rate_limit_max_wait_secs: u64,
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

const fn default_mentions_page_size() -> u32 {
    DEFAULT_MENTIONS_PAGE_SIZE
}

const fn default_http_timeout_secs() -> u64 {
    DEFAULT_HTTP_TIMEOUT_SECS
}

const fn default_rate_limit_max_wait_secs() -> u64 {
    DEFAULT_RATE_LIMIT_MAX_WAIT_SECS
}

impl TwitterSettings {
    /// Create new settings by loading from environment and files.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if loading fails or the bearer token is missing.
    pub fn new() -> Result<Self, ConfigError> {
        taofu_assistant_core::config::build_config()?.try_deserialize()
    }

    /// Settings for `bearer_token` with every other option at its default.
    #[must_use]
    pub fn with_token(bearer_token: impl Into<String>) -> Self {
        Self {
            twitter_bearer_token: bearer_token.into(),
            twitter_api_base_url: default_api_base_url(),
            twitter_mentions_page_size: DEFAULT_MENTIONS_PAGE_SIZE,
            twitter_http_timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
            twitter_rate_limit_max_wait_secs: DEFAULT_RATE_LIMIT_MAX_WAIT_SECS,
        }
    }

    /// Page size within the API's accepted range.
    #[must_use]
    pub fn page_size(&self) -> u32 {
        let (min, max) = MENTIONS_PAGE_SIZE_RANGE;
        self.twitter_mentions_page_size.clamp(min, max)
    }

    /// API root without a trailing slash.
    #[must_use]
    pub fn api_base_url(&self) -> &str {
        self.twitter_api_base_url.trim_end_matches('/')
    }

    /// HTTP request timeout.
    #[must_use]
    pub const fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.twitter_http_timeout_secs)
    }

    /// Longest rate-limit wait.
    #[must_use]
    pub const fn rate_limit_max_wait(&self) -> Duration {
        Duration::from_secs(self.twitter_rate_limit_max_wait_secs)
    }
}

/// Combined settings used by the Twitter transport layer.
#[derive(Clone)]
pub struct BotSettings {
    /// Assistant settings shared with the core.
    pub assistant: Arc<AssistantSettings>,
    /// Twitter-specific settings.
    pub twitter: Arc<TwitterSettings>,
}

impl BotSettings {
    /// Create a new combined settings bundle.
    #[must_use]
    pub fn new(assistant: AssistantSettings, twitter: TwitterSettings) -> Self {
        Self {
            assistant: Arc::new(assistant),
            twitter: Arc::new(twitter),
        }
    }
}
