//! Testing helpers and mock utilities.
//!
//! Provides convenient constructors for mocked providers and sinks.

use crate::analytics::MockAnalyticsSink;
use crate::llm::{LlmError, MockCompletionProvider};
use crate::social::Mention;
use mockall::predicate::always;

/// Create a mock completion provider that always answers `response_text`.
#[must_use]
pub fn mock_provider_simple(response_text: &'static str) -> MockCompletionProvider {
    let mut mock = MockCompletionProvider::new();
    mock.expect_generate_completion()
        .with(always(), always())
        .returning(move |_, _| Ok(response_text.to_string()));
    mock
}

/// Create a mock completion provider whose every call fails.
#[must_use]
pub fn mock_provider_failing() -> MockCompletionProvider {
    let mut mock = MockCompletionProvider::new();
    mock.expect_generate_completion()
        .returning(|_, _| Err(LlmError::NetworkError("connection reset".to_string())));
    mock
}

/// Create an analytics sink that accepts and drops every record.
#[must_use]
pub fn mock_analytics_noop() -> MockAnalyticsSink {
    let mut mock = MockAnalyticsSink::new();
    mock.expect_record().returning(|_| Ok(()));
    mock
}

/// A mention from `alice` with the given id and raw text.
#[must_use]
pub fn mention(id: &str, text: &str) -> Mention {
    Mention {
        id: id.to_string(),
        author_id: "1001".to_string(),
        author_handle: "alice".to_string(),
        text: text.to_string(),
        created_at: None,
    }
}
