//! In-process fakes shared by the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use taofu_assistant_core::analytics::{AnalyticsError, AnalyticsSink, QuestionRecord};
use taofu_assistant_core::ledger::LedgerStore;
use taofu_assistant_core::llm::{CompletionProvider, LlmError};
use taofu_assistant_core::poller::PollerDeps;
use taofu_assistant_core::social::{Mention, MentionBatch, SocialClient, SocialError};

pub fn mention(id: &str, author: &str, text: &str) -> Mention {
    Mention {
        id: id.to_string(),
        author_id: format!("id-{author}"),
        author_handle: author.to_string(),
        text: text.to_string(),
        created_at: None,
    }
}

/// Serves the same mention timeline on every fetch and records replies.
#[derive(Default)]
pub struct FakeSocial {
    timeline: Mutex<Vec<Mention>>,
    post_failures: Mutex<VecDeque<String>>,
    posted: Mutex<Vec<(String, String)>>,
}

impl FakeSocial {
    pub fn with_timeline(mentions: Vec<Mention>) -> Self {
        Self {
            timeline: Mutex::new(mentions),
            ..Self::default()
        }
    }

    /// Fail the next post with `message`.
    pub fn fail_next_post(&self, message: &str) {
        if let Ok(mut failures) = self.post_failures.lock() {
            failures.push_back(message.to_string());
        }
    }

    pub fn posted(&self) -> Vec<(String, String)> {
        self.posted.lock().map(|p| p.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl SocialClient for FakeSocial {
    async fn fetch_mentions(&self, _since_id: Option<String>) -> Result<MentionBatch, SocialError> {
        let mentions = self
            .timeline
            .lock()
            .map_err(|e| SocialError::Fetch(e.to_string()))?
            .clone();
        Ok(MentionBatch::from_mentions(mentions))
    }

    async fn post_reply(&self, parent_id: &str, text: &str) -> Result<String, SocialError> {
        let failure = self
            .post_failures
            .lock()
            .map_err(|e| SocialError::Post(e.to_string()))?
            .pop_front();
        if let Some(message) = failure {
            return Err(SocialError::Post(message));
        }

        let mut posted = self
            .posted
            .lock()
            .map_err(|e| SocialError::Post(e.to_string()))?;
        posted.push((parent_id.to_string(), text.to_string()));
        Ok(format!("reply-{}", posted.len()))
    }

    async fn self_handle(&self) -> Result<String, SocialError> {
        Ok("taofubot".to_string())
    }
}

/// Answers with a fixed text and counts calls.
pub struct FakeProvider {
    answer: String,
    calls: AtomicUsize,
}

impl FakeProvider {
    pub fn new(answer: &str) -> Self {
        Self {
            answer: answer.to_string(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CompletionProvider for FakeProvider {
    async fn generate_completion(
        &self,
        _system_prompt: &str,
        _user_text: &str,
    ) -> Result<String, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.answer.clone())
    }
}

#[derive(Default)]
pub struct MemoryAnalytics {
    records: Mutex<Vec<QuestionRecord>>,
}

impl MemoryAnalytics {
    pub fn records(&self) -> Vec<QuestionRecord> {
        self.records.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl AnalyticsSink for MemoryAnalytics {
    async fn record(&self, record: QuestionRecord) -> Result<(), AnalyticsError> {
        if let Ok(mut records) = self.records.lock() {
            records.push(record);
        }
        Ok(())
    }
}

pub fn deps(
    social: &Arc<FakeSocial>,
    provider: &Arc<FakeProvider>,
    store: Arc<dyn LedgerStore>,
    analytics: &Arc<MemoryAnalytics>,
) -> PollerDeps {
    PollerDeps {
        social: social.clone(),
        provider: provider.clone(),
        ledger_store: store,
        analytics: analytics.clone(),
    }
}
