use anyhow::Context;
use dotenvy::dotenv;
use regex::Regex;
use std::io::{self, Write};
use std::sync::Arc;
use taofu_assistant_core::config::AssistantSettings;
use taofu_assistant_transport_twitter::config::{BotSettings, TwitterSettings};
use taofu_assistant_transport_twitter::runner::run_bot;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{prelude::*, EnvFilter};

/// Regex patterns for redacting sensitive data
struct RedactionPatterns {
    openai_key: Regex,
    bearer: Regex,
    secret_assignment: Regex,
}

impl RedactionPatterns {
    /// Initialize all regex patterns
    ///
    /// # Errors
    ///
    /// Returns an error if any regex pattern is invalid
    fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            openai_key: Regex::new(r"sk-[A-Za-z0-9_-]{16,}")?,
            bearer: Regex::new(r"(?i)(bearer\s+)[A-Za-z0-9._~+/=%-]+")?,
            secret_assignment: Regex::new(r"([A-Z0-9_]*(?:API_KEY|TOKEN|SECRET)=)[^\s&]+")?,
        })
    }

    fn redact(&self, input: &str) -> String {
        let mut output = input.to_string();
        output = self
            .secret_assignment
            .replace_all(&output, "$1[MASKED]")
            .to_string();
        output = self
            .bearer
            .replace_all(&output, "$1[MASKED]")
            .to_string();
        output = self
            .openai_key
            .replace_all(&output, "[OPENAI_KEY]")
            .to_string();
        output
    }
}

struct RedactingWriter<W: Write> {
    inner: W,
    patterns: Arc<RedactionPatterns>,
}

impl<W: Write> RedactingWriter<W> {
    const fn new(inner: W, patterns: Arc<RedactionPatterns>) -> Self {
        Self { inner, patterns }
    }
}

impl<W: Write> Write for RedactingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let s = String::from_utf8_lossy(buf);
        let redacted = self.patterns.redact(&s);
        self.inner.write_all(redacted.as_bytes())?;
        // Callers expect the input length even though the redacted text differs.
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

struct RedactingMakeWriter<F> {
    make_inner: F,
    patterns: Arc<RedactionPatterns>,
}

impl<F> RedactingMakeWriter<F> {
    const fn new(make_inner: F, patterns: Arc<RedactionPatterns>) -> Self {
        Self {
            make_inner,
            patterns,
        }
    }
}

impl<'a, F, W> tracing_subscriber::fmt::MakeWriter<'a> for RedactingMakeWriter<F>
where
    F: Fn() -> W + 'static,
    W: Write,
{
    type Writer = RedactingWriter<W>;

    fn make_writer(&'a self) -> Self::Writer {
        RedactingWriter::new((self.make_inner)(), self.patterns.clone())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    // Redaction must be ready before the first log line
    let patterns = Arc::new(RedactionPatterns::new().map_err(|e| {
        eprintln!("Failed to compile regex patterns: {e}");
        e
    })?);

    init_logging(patterns);

    info!("Starting Taofu Twitter assistant...");

    let settings = init_settings()?;

    let cancel = CancellationToken::new();
    spawn_shutdown_listener(cancel.clone());

    run_bot(settings, cancel).await
}

fn init_logging(patterns: Arc<RedactionPatterns>) {
    let make_writer = RedactingMakeWriter::new(io::stderr, patterns);

    let debug_mode = std::env::var("DEBUG_MODE")
        .map(|v| v == "true" || v == "1")
        .unwrap_or(false);

    let filter = if debug_mode {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(
                "info,taofu_assistant_core=info,taofu_assistant_transport_twitter=info,hyper=warn,h2=error,reqwest=warn,tokio=warn,async_openai=warn",
            )
        })
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(make_writer))
        .init();
}

fn init_settings() -> anyhow::Result<Arc<BotSettings>> {
    let assistant_settings = AssistantSettings::new()
        .inspect_err(|e| error!("Failed to load assistant configuration: {e}"))
        .context("Failed to load assistant configuration")?;
    let twitter_settings = TwitterSettings::new()
        .inspect_err(|e| error!("Failed to load twitter configuration: {e}"))
        .context("Failed to load twitter configuration")?;

    info!("Configuration loaded successfully.");
    Ok(Arc::new(BotSettings::new(assistant_settings, twitter_settings)))
}

fn spawn_shutdown_listener(cancel: CancellationToken) {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Shutdown requested, finishing current cycle..."),
            Err(e) => error!("Failed to listen for Ctrl-C: {e}"),
        }
        cancel.cancel();
    });
}
