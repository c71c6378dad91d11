//! Configuration and settings management
//!
//! Loads settings from optional config files and environment variables.
//! Settings are built once at startup and shared read-only.

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Default chat model
pub const DEFAULT_CHAT_MODEL: &str = "gpt-4";
/// Completion token cap
pub const DEFAULT_MAX_TOKENS: u32 = 200;
/// Sampling temperature for answers
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
/// Seconds between polling cycles
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 60;
/// Seconds to back off after a failed cycle
pub const DEFAULT_ERROR_BACKOFF_SECS: u64 = 60;
/// Call-to-action appended to short replies
pub const DEFAULT_CTA_TEXT: &str = "Learn more at taofu.xyz";

/// Build the layered configuration source shared by all settings structs.
///
/// Sources, later ones win: `config/default`, `config/{RUN_MODE}`,
/// `config/local`, `APP__`-prefixed env vars, then plain env vars.
///
/// # Errors
///
/// Returns a `ConfigError` if a present source cannot be read.
pub fn build_config() -> Result<Config, ConfigError> {
    let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

    Config::builder()
        .add_source(File::with_name("config/default").required(false))
        .add_source(File::with_name(&format!("config/{run_mode}")).required(false))
        // Not checked into git
        .add_source(File::with_name("config/local").required(false))
        .add_source(Environment::with_prefix("APP").separator("__"))
        // UPPER_SNAKE_CASE env vars map onto snake_case keys; empty ones count as unset
        .add_source(Environment::default().ignore_empty(true))
        .build()
}

/// Assistant settings loaded from environment variables
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AssistantSettings {
    /// OpenAI API key
    pub openai_api_key: Option<String>,
    /// Base URL of an OpenAI-compatible API, if not api.openai.com
    pub openai_base_url: Option<String>,
    /// Chat model used for answers
    #[serde(default = "default_chat_model")]
    pub chat_model: String,
    /// Completion token cap
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Knowledge base text file
    #[serde(default = "default_knowledge_path")]
    pub knowledge_path: PathBuf,
    /// System instructions text file
    #[serde(default = "default_system_instructions_path")]
    pub system_instructions_path: PathBuf,
    /// Reply ledger journal
    #[serde(default = "default_ledger_path")]
    pub ledger_path: PathBuf,
    /// Question log
    #[serde(default = "default_analytics_path")]
    pub analytics_path: PathBuf,

    /// Seconds between polling cycles
    #[serde(default = "default_poll_interval_secs", alias = "twitter_check_interval")]
    pub poll_interval_secs: u64,
    /// Seconds to wait after a failed cycle
    #[serde(default = "default_error_backoff_secs")]
    pub error_backoff_secs: u64,
    /// Reply length budget before the call-to-action
    #[serde(default = "default_max_reply_length")]
    pub max_reply_length: usize,
    /// Call-to-action appended to short replies (empty disables it)
    #[serde(default = "default_cta_text")]
    pub cta_text: String,
    /// Replies shorter than this get the call-to-action
    #[serde(default = "default_cta_budget")]
    pub cta_budget: usize,
    /// The bot's own handle; resolved from the platform when unset
    pub bot_handle: Option<String>,
}

fn default_chat_model() -> String {
    DEFAULT_CHAT_MODEL.to_string()
}

const fn default_max_tokens() -> u32 {
    DEFAULT_MAX_TOKENS
}

const fn default_temperature() -> f32 {
    DEFAULT_TEMPERATURE
}

fn default_knowledge_path() -> PathBuf {
    PathBuf::from("knowledge.txt")
}

fn default_system_instructions_path() -> PathBuf {
    PathBuf::from("system_instructions.txt")
}

fn default_ledger_path() -> PathBuf {
    PathBuf::from("data/replied_mentions.jsonl")
}

fn default_analytics_path() -> PathBuf {
    PathBuf::from("data/analytics.jsonl")
}

const fn default_poll_interval_secs() -> u64 {
    DEFAULT_POLL_INTERVAL_SECS
}

const fn default_error_backoff_secs() -> u64 {
    DEFAULT_ERROR_BACKOFF_SECS
}

const fn default_max_reply_length() -> usize {
    crate::pipeline::shape::DEFAULT_MAX_REPLY_LENGTH
}

fn default_cta_text() -> String {
    DEFAULT_CTA_TEXT.to_string()
}

const fn default_cta_budget() -> usize {
    crate::pipeline::shape::DEFAULT_CTA_BUDGET
}

impl Default for AssistantSettings {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            openai_base_url: None,
            chat_model: default_chat_model(),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
            knowledge_path: default_knowledge_path(),
            system_instructions_path: default_system_instructions_path(),
            ledger_path: default_ledger_path(),
            analytics_path: default_analytics_path(),
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            error_backoff_secs: DEFAULT_ERROR_BACKOFF_SECS,
            max_reply_length: default_max_reply_length(),
            cta_text: default_cta_text(),
            cta_budget: default_cta_budget(),
            bot_handle: None,
        }
    }
}

impl AssistantSettings {
    /// Create new settings by loading from environment and files
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use taofu_assistant_core::config::AssistantSettings;
    ///
    /// let settings = AssistantSettings::new().expect("Failed to load configuration");
    /// ```
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if loading fails.
    pub fn new() -> Result<Self, ConfigError> {
        build_config()?.try_deserialize()
    }

    /// Interval between successful polling cycles
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// Back-off after a failed polling cycle
    #[must_use]
    pub const fn error_backoff(&self) -> Duration {
        Duration::from_secs(self.error_backoff_secs)
    }

    /// Configured bot handle without a leading `@`, if non-empty
    #[must_use]
    pub fn bot_handle(&self) -> Option<&str> {
        self.bot_handle
            .as_deref()
            .map(|h| h.trim().trim_start_matches('@'))
            .filter(|h| !h.is_empty())
    }
}
