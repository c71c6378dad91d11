//! Completion providers
//!
//! The poller depends on [`CompletionProvider`] only; [`OpenAiProvider`] is the
//! production implementation over an OpenAI-compatible chat API.

mod common;
mod openai;

pub use openai::OpenAiProvider;

use thiserror::Error;

/// Errors that can occur during LLM operations
#[derive(Debug, Error)]
pub enum LlmError {
    /// Error returned by the provider's API
    #[error("API error: {0}")]
    ApiError(String),
    /// Error during network communication
    #[error("Network error: {0}")]
    NetworkError(String),
    /// Missing provider configuration or API key
    #[error("Missing client/API key: {0}")]
    MissingConfig(String),
    /// Any other unexpected error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

/// Interface for chat-completion providers
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Generate an answer to `user_text` under `system_prompt`
    async fn generate_completion(
        &self,
        system_prompt: &str,
        user_text: &str,
    ) -> Result<String, LlmError>;
}
