use super::common::{build_openai_messages, extract_openai_response};
use super::{CompletionProvider, LlmError};
use crate::config::AssistantSettings;
use async_openai::{config::OpenAIConfig, types::chat::CreateChatCompletionRequestArgs, Client};
use async_trait::async_trait;
use tracing::debug;

/// Completion provider backed by an OpenAI-compatible chat API
pub struct OpenAiProvider {
    client: Client<OpenAIConfig>,
    model: String,
    max_tokens: u32,
    temperature: f32,
}

impl OpenAiProvider {
    /// Create a provider for `model` with the given key and optional base URL
    #[must_use]
    pub fn new(api_key: String, api_base: Option<String>, model: String) -> Self {
        let mut config = OpenAIConfig::new().with_api_key(api_key);
        if let Some(base) = api_base {
            config = config.with_api_base(base);
        }
        Self {
            client: Client::with_config(config),
            model,
            max_tokens: crate::config::DEFAULT_MAX_TOKENS,
            temperature: crate::config::DEFAULT_TEMPERATURE,
        }
    }

    /// Create a provider from settings
    ///
    /// # Errors
    ///
    /// Returns `LlmError::MissingConfig` if no API key is configured.
    pub fn from_settings(settings: &AssistantSettings) -> Result<Self, LlmError> {
        let api_key = settings
            .openai_api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| LlmError::MissingConfig("OPENAI_API_KEY is missing".into()))?;

        Ok(Self::new(
            api_key,
            settings.openai_base_url.clone(),
            settings.chat_model.clone(),
        )
        .with_sampling(settings.max_tokens, settings.temperature))
    }

    /// Override the completion token cap and temperature
    #[must_use]
    pub fn with_sampling(mut self, max_tokens: u32, temperature: f32) -> Self {
        self.max_tokens = max_tokens;
        self.temperature = temperature;
        self
    }
}

#[async_trait]
impl CompletionProvider for OpenAiProvider {
    async fn generate_completion(
        &self,
        system_prompt: &str,
        user_text: &str,
    ) -> Result<String, LlmError> {
        let messages = build_openai_messages(system_prompt, user_text)?;

        let request = CreateChatCompletionRequestArgs::default()
            .model(self.model.as_str())
            .messages(messages)
            .max_tokens(self.max_tokens)
            .temperature(self.temperature)
            .build()
            .map_err(|e| LlmError::Unknown(e.to_string()))?;

        debug!(model = %self.model, "Requesting chat completion");

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| LlmError::ApiError(e.to_string()))?;

        extract_openai_response(&response)
    }
}
