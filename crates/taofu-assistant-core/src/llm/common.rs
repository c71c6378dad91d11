//! Request/response helpers for OpenAI-compatible chat APIs

use super::LlmError;
use async_openai::types::chat::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestUserMessageArgs, CreateChatCompletionResponse,
};

/// Build the system + user message pair for a single-turn question
///
/// # Errors
///
/// Returns `LlmError::Unknown` if message building fails.
pub fn build_openai_messages(
    system_prompt: &str,
    user_text: &str,
) -> Result<Vec<ChatCompletionRequestMessage>, LlmError> {
    Ok(vec![
        ChatCompletionRequestSystemMessageArgs::default()
            .content(system_prompt)
            .build()
            .map_err(|e| LlmError::Unknown(e.to_string()))?
            .into(),
        ChatCompletionRequestUserMessageArgs::default()
            .content(user_text)
            .build()
            .map_err(|e| LlmError::Unknown(e.to_string()))?
            .into(),
    ])
}

/// Extract trimmed text from the first choice of a chat completion
///
/// # Errors
///
/// Returns `LlmError::ApiError` if the response has no text.
pub fn extract_openai_response(
    response: &CreateChatCompletionResponse,
) -> Result<String, LlmError> {
    response
        .choices
        .first()
        .and_then(|c| c.message.content.as_deref())
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
        .ok_or_else(|| LlmError::ApiError("Empty response".to_string()))
}
