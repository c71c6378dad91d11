//! Mention polling loop
//!
//! One cycle fetches mentions and walks them one at a time:
//!
//! ```text
//! Idle -> Fetching -> Processing(mention) -> Skipped | Replying -> Replied | Failed -> Idle
//! ```
//!
//! A mention id enters the [`ReplyLedger`] only once its outcome is final
//! (skipped as a non-question, or replied to). Provider and post failures leave
//! it out so the next cycle retries it.
//!
//! The ledger is loaded by the first cycle rather than at construction, so a
//! store that is unreachable at startup is retried with the error backoff.

use crate::analytics::{AnalyticsSink, QuestionRecord};
use crate::config::AssistantSettings;
use crate::ledger::{LedgerError, LedgerStore, ReplyLedger};
use crate::llm::{CompletionProvider, LlmError};
use crate::pipeline::{append_call_to_action, is_question, normalize, truncate};
use crate::prompt::SystemPrompt;
use crate::social::{Mention, Platform, SocialClient, SocialError};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

/// Cycle-level failures; the loop logs them and backs off
#[derive(Debug, Error)]
pub enum PollerError {
    /// Mentions could not be fetched
    #[error("Fetch failed: {0}")]
    Fetch(#[from] SocialError),
    /// The ledger could not be loaded or flushed
    #[error("Ledger I/O failed: {0}")]
    Ledger(#[from] LedgerError),
}

/// Knobs of the polling loop
#[derive(Debug, Clone)]
pub struct PollerConfig {
    /// Sleep after a completed cycle
    pub poll_interval: Duration,
    /// Sleep after a failed cycle
    pub error_backoff: Duration,
    /// Reply length budget before the call-to-action
    pub max_reply_length: usize,
    /// Call-to-action appended to short replies
    pub cta_text: String,
    /// Replies shorter than this get the call-to-action
    pub cta_budget: usize,
    /// Label used in question records
    pub platform: Platform,
}

impl PollerConfig {
    /// Poller settings for `platform` taken from the assistant settings
    #[must_use]
    pub fn from_settings(settings: &AssistantSettings, platform: Platform) -> Self {
        Self {
            poll_interval: settings.poll_interval(),
            error_backoff: settings.error_backoff(),
            max_reply_length: settings.max_reply_length,
            cta_text: settings.cta_text.clone(),
            cta_budget: settings.cta_budget,
            platform,
        }
    }
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self::from_settings(&AssistantSettings::default(), Platform::Twitter)
    }
}

/// Collaborators the poller drives
#[derive(Clone)]
pub struct PollerDeps {
    /// Source of mentions and sink for replies
    pub social: Arc<dyn SocialClient>,
    /// Answer generator
    pub provider: Arc<dyn CompletionProvider>,
    /// Durable ledger storage
    pub ledger_store: Arc<dyn LedgerStore>,
    /// Question log
    pub analytics: Arc<dyn AnalyticsSink>,
}

/// What happened to a single mention
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MentionOutcome {
    /// Already in the ledger
    AlreadyHandled,
    /// Not a question; recorded as handled without replying
    Skipped,
    /// Reply posted and recorded
    Replied {
        /// Id of the posted reply
        reply_id: String,
    },
    /// Completion failed; retried next cycle
    ProviderFailed,
    /// Posting failed; retried next cycle
    PostFailed,
}

impl MentionOutcome {
    /// Whether the mention is now in the ledger
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::AlreadyHandled | Self::Skipped | Self::Replied { .. }
        )
    }
}

/// Tally of one polling cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Mentions returned by the platform
    pub fetched: usize,
    /// Mentions found in the ledger
    pub already_handled: usize,
    /// Non-questions recorded without a reply
    pub skipped: usize,
    /// Replies posted
    pub replied: usize,
    /// Provider or post failures
    pub failed: usize,
}

impl CycleReport {
    fn count(&mut self, outcome: &MentionOutcome) {
        match outcome {
            MentionOutcome::AlreadyHandled => self.already_handled += 1,
            MentionOutcome::Skipped => self.skipped += 1,
            MentionOutcome::Replied { .. } => self.replied += 1,
            MentionOutcome::ProviderFailed | MentionOutcome::PostFailed => self.failed += 1,
        }
    }
}

/// Polls mentions and answers the questions among them
pub struct MentionPoller {
    deps: PollerDeps,
    config: PollerConfig,
    system_prompt: SystemPrompt,
    bot_handle: String,
    ledger: ReplyLedger,
    ledger_loaded: bool,
    /// In-memory ledger holds ids the store has not confirmed.
    unflushed: bool,
    since_id: Option<String>,
}

impl MentionPoller {
    /// Create a poller. The ledger is loaded by the first cycle.
    #[must_use]
    pub fn new(
        deps: PollerDeps,
        config: PollerConfig,
        system_prompt: SystemPrompt,
        bot_handle: impl Into<String>,
    ) -> Self {
        Self {
            deps,
            config,
            system_prompt,
            bot_handle: bot_handle.into(),
            ledger: ReplyLedger::new(),
            ledger_loaded: false,
            unflushed: false,
            since_id: None,
        }
    }

    /// Load the ledger from its store, replacing the in-memory copy
    ///
    /// # Errors
    ///
    /// Returns `PollerError::Ledger` if the store cannot be read.
    pub async fn load_ledger(&mut self) -> Result<(), PollerError> {
        self.ledger = self.deps.ledger_store.load().await?;
        self.ledger_loaded = true;
        info!(
            handled = self.ledger.len(),
            bot_handle = %self.bot_handle,
            "Reply ledger loaded"
        );
        Ok(())
    }

    /// Whether the ledger has been loaded from its store
    #[must_use]
    pub const fn is_ledger_loaded(&self) -> bool {
        self.ledger_loaded
    }

    /// Current in-memory ledger
    #[must_use]
    pub const fn ledger(&self) -> &ReplyLedger {
        &self.ledger
    }

    /// Whether the ledger has ids the store has not confirmed
    #[must_use]
    pub const fn has_unflushed_ledger(&self) -> bool {
        self.unflushed
    }

    /// Watermark passed as `since` on the next fetch
    #[must_use]
    pub fn since_id(&self) -> Option<&str> {
        self.since_id.as_deref()
    }

    /// Poll until `cancel` fires.
    ///
    /// Cancellation is observed between cycles and during the sleep; a cycle
    /// in progress always completes.
    pub async fn run(mut self, cancel: CancellationToken) {
        info!(
            interval_secs = self.config.poll_interval.as_secs(),
            "Monitoring mentions for @{}", self.bot_handle
        );

        while !cancel.is_cancelled() {
            let pause = match self.run_cycle().await {
                Ok(report) => {
                    info!(
                        fetched = report.fetched,
                        replied = report.replied,
                        skipped = report.skipped,
                        already_handled = report.already_handled,
                        failed = report.failed,
                        "Polling cycle complete"
                    );
                    self.config.poll_interval
                }
                Err(e) => {
                    error!("Error in mention monitoring: {e}");
                    self.config.error_backoff
                }
            };

            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                () = tokio::time::sleep(pause) => {}
            }
        }

        info!("Mention poller stopped");
    }

    /// Run one fetch-and-answer cycle
    ///
    /// # Errors
    ///
    /// Returns `PollerError::Fetch` if mentions cannot be fetched and
    /// `PollerError::Ledger` if the ledger cannot be loaded or a pending
    /// flush fails again. Nothing is fetched until the ledger is loaded.
    #[instrument(skip(self), fields(since_id = ?self.since_id))]
    pub async fn run_cycle(&mut self) -> Result<CycleReport, PollerError> {
        if !self.ledger_loaded {
            self.load_ledger().await?;
        }

        if self.unflushed {
            self.deps.ledger_store.save(&self.ledger).await?;
            self.unflushed = false;
            info!(handled = self.ledger.len(), "Pending ledger flushed");
        }

        let batch = self
            .deps
            .social
            .fetch_mentions(self.since_id.clone())
            .await?;

        let mut report = CycleReport {
            fetched: batch.mentions.len(),
            ..CycleReport::default()
        };
        let mut all_terminal = true;

        for mention in &batch.mentions {
            let outcome = self.process_mention(mention).await;
            all_terminal &= outcome.is_terminal();
            report.count(&outcome);
        }

        // Moving the watermark past a failed mention would hide it from later fetches.
        if all_terminal {
            if let Some(newest) = batch.newest_id {
                self.since_id = Some(newest);
            }
        }

        Ok(report)
    }

    /// Walk one mention through the pipeline
    async fn process_mention(&mut self, mention: &Mention) -> MentionOutcome {
        if self.ledger.contains(&mention.id) {
            return MentionOutcome::AlreadyHandled;
        }

        let question = normalize(&mention.text, &self.bot_handle);

        if !is_question(&question) {
            info!(mention_id = %mention.id, "Skipping mention: not a valid question");
            self.mark_handled(&mention.id).await;
            return MentionOutcome::Skipped;
        }

        info!(mention_id = %mention.id, author = %mention.author_handle, "Processing question: {question}");

        let answer = match self.generate_answer(&question).await {
            Ok(answer) => answer,
            Err(e) => {
                warn!(mention_id = %mention.id, "Completion failed, will retry next cycle: {e}");
                return MentionOutcome::ProviderFailed;
            }
        };

        let reply = self.shape_reply(&answer);

        let record = QuestionRecord::new(
            mention.author_id.clone(),
            mention.author_handle.clone(),
            question,
            &reply,
            self.config.platform,
        );
        if let Err(e) = self.deps.analytics.record(record).await {
            warn!(mention_id = %mention.id, "Failed to log question: {e}");
        }

        match self.deps.social.post_reply(&mention.id, &reply).await {
            Ok(reply_id) => {
                info!(mention_id = %mention.id, reply_id = %reply_id, "Replied to mention");
                self.mark_handled(&mention.id).await;
                MentionOutcome::Replied { reply_id }
            }
            Err(e) => {
                error!(mention_id = %mention.id, "Error replying to mention: {e}");
                MentionOutcome::PostFailed
            }
        }
    }

    async fn generate_answer(&self, question: &str) -> Result<String, LlmError> {
        self.deps
            .provider
            .generate_completion(self.system_prompt.as_str(), question)
            .await
    }

    fn shape_reply(&self, answer: &str) -> String {
        let truncated = truncate(answer, self.config.max_reply_length);
        append_call_to_action(&truncated, &self.config.cta_text, self.config.cta_budget)
    }

    /// Add `id` to the ledger and persist it.
    ///
    /// A failed write keeps the id in memory (no duplicate reply from this
    /// process) and schedules a full snapshot for the next write.
    async fn mark_handled(&mut self, id: &str) {
        if !self.ledger.mark_handled(id) {
            return;
        }

        let result = if self.unflushed {
            self.deps.ledger_store.save(&self.ledger).await
        } else {
            self.deps.ledger_store.record(id, &self.ledger).await
        };

        match result {
            Ok(()) => {
                self.unflushed = false;
                debug!(mention_id = %id, "Ledger updated");
            }
            Err(e) => {
                self.unflushed = true;
                error!(mention_id = %id, "Failed to persist reply ledger: {e}");
            }
        }
    }
}
