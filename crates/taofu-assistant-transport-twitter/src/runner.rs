use crate::client::TwitterClient;
use crate::config::BotSettings;
use anyhow::Context;
use std::sync::Arc;
use taofu_assistant_core::analytics::JsonlAnalyticsSink;
use taofu_assistant_core::ledger::FileLedgerStore;
use taofu_assistant_core::llm::OpenAiProvider;
use taofu_assistant_core::poller::{MentionPoller, PollerConfig, PollerDeps};
use taofu_assistant_core::prompt::SystemPrompt;
use taofu_assistant_core::social::{Platform, SocialClient};
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Run the Twitter mention poller until `cancel` fires.
///
/// # Errors
///
/// Returns an error if a collaborator cannot be initialized: missing OpenAI
/// key, unreadable prompt files, an unreadable ledger or a failed self lookup.
pub async fn run_bot(settings: Arc<BotSettings>, cancel: CancellationToken) -> anyhow::Result<()> {
    let assistant = settings.assistant.as_ref();

    let provider = Arc::new(
        OpenAiProvider::from_settings(assistant).context("Failed to initialize OpenAI provider")?,
    );
    info!(model = %assistant.chat_model, "OpenAI provider initialized.");

    let social = Arc::new(TwitterClient::new(&settings.twitter)?);
    let bot_handle = resolve_bot_handle(&settings, social.as_ref()).await?;

    let system_prompt = SystemPrompt::load(
        &assistant.system_instructions_path,
        &assistant.knowledge_path,
        Platform::Twitter,
    )
    .await
    .context("Failed to load system prompt")?;

    let deps = PollerDeps {
        social,
        provider,
        ledger_store: Arc::new(FileLedgerStore::new(&assistant.ledger_path)),
        analytics: Arc::new(JsonlAnalyticsSink::new(&assistant.analytics_path)),
    };

    let poller = MentionPoller::new(
        deps,
        PollerConfig::from_settings(assistant, Platform::Twitter),
        system_prompt,
        bot_handle,
    );

    info!("Bot is running...");
    poller.run(cancel).await;
    Ok(())
}

async fn resolve_bot_handle(
    settings: &BotSettings,
    social: &dyn SocialClient,
) -> anyhow::Result<String> {
    if let Some(handle) = settings.assistant.bot_handle() {
        return Ok(handle.to_string());
    }
    social
        .self_handle()
        .await
        .context("Failed to resolve the bot's own handle")
}
