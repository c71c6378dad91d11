//! Question log
//!
//! Every answered question is appended to a JSON Lines file as a
//! [`QuestionRecord`]. Writing is best-effort: the poller logs sink failures
//! and carries on with the reply.

/// Offline reporting over recorded questions.
pub mod report;

use crate::pipeline::shape::{preview, PREVIEW_LENGTH};
use crate::social::Platform;
use async_trait::async_trait;
use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::io::AsyncWriteExt;

/// Errors that can occur while writing or reading the question log
#[derive(Debug, Error)]
pub enum AnalyticsError {
    /// Standard I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// Error during JSON serialization or deserialization
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// One answered question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionRecord {
    /// Local time the answer was produced
    pub timestamp: NaiveDateTime,
    /// Platform id of the asker
    pub user_id: String,
    /// Asker's handle
    pub username: String,
    /// Normalized question text
    pub question: String,
    /// First 100 characters of the reply
    pub response_preview: String,
    /// Where the question was asked
    pub platform: Platform,
}

impl QuestionRecord {
    /// Build a record stamped with the current local time
    #[must_use]
    pub fn new(
        user_id: impl Into<String>,
        username: impl Into<String>,
        question: impl Into<String>,
        response: &str,
        platform: Platform,
    ) -> Self {
        Self {
            timestamp: Local::now().naive_local(),
            user_id: user_id.into(),
            username: username.into(),
            question: question.into(),
            response_preview: preview(response, PREVIEW_LENGTH),
            platform,
        }
    }
}

/// Destination for question records
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AnalyticsSink: Send + Sync {
    /// Store one record
    async fn record(&self, record: QuestionRecord) -> Result<(), AnalyticsError>;
}

/// Appends records as JSON Lines
#[derive(Debug, Clone)]
pub struct JsonlAnalyticsSink {
    path: PathBuf,
}

impl JsonlAnalyticsSink {
    /// Sink writing to `path`; parent directories are created on first write
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Log location
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl AnalyticsSink for JsonlAnalyticsSink {
    async fn record(&self, record: QuestionRecord) -> Result<(), AnalyticsError> {
        if let Some(dir) = self.path.parent() {
            if !dir.as_os_str().is_empty() {
                tokio::fs::create_dir_all(dir).await?;
            }
        }

        let mut line = serde_json::to_string(&record)?;
        line.push('\n');

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }
}
