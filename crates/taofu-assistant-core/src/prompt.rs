//! System prompt composition
//!
//! The prompt is the platform instructions followed by the knowledge base.
//! Both come from text files; a missing file falls back to built-in text.

use crate::social::Platform;
use std::io;
use std::path::Path;
use thiserror::Error;
use tracing::{info, warn};

/// Knowledge used when `knowledge.txt` is absent
pub const FALLBACK_KNOWLEDGE: &str =
    "Taofu is a decentralized ecosystem. Visit taofu.xyz for more information.";

const TWITTER_INSTRUCTIONS: &str = "You are the official Taofu ecosystem assistant on Twitter. You help people learn about the Taofu ecosystem and provide accurate information based on the official documentation.

IMPORTANT RULES:
1. Only answer questions based on the provided Taofu knowledge base
2. Never make up numbers, technical details, or tokenomics information
3. If you're unsure about something, admit it and direct users to taofu.xyz
4. Keep responses concise (under 250 characters for Twitter)
5. Always mention you're the official Taofu assistant
6. Encourage users to visit taofu.xyz for more information
7. Be friendly and helpful";

const CHAT_INSTRUCTIONS: &str = "You are the official Taofu ecosystem assistant. You help people learn about the Taofu ecosystem and provide accurate information based on the official documentation.

IMPORTANT RULES:
1. Only answer questions based on the provided Taofu knowledge base
2. Never make up numbers, technical details, or tokenomics information
3. If you're unsure about something, admit it and direct users to taofu.xyz
4. Be concise and helpful
5. Always mention you're the official Taofu assistant
6. Encourage users to visit taofu.xyz for more information";

const REMINDER: &str = "Remember: If asked about specific technical details, tokenomics, or information not covered in the knowledge base, direct users to taofu.xyz for the most current and accurate information.";

/// Errors while reading prompt sources
#[derive(Debug, Error)]
pub enum PromptError {
    /// A prompt file exists but could not be read
    #[error("Failed to read {path}: {source}")]
    Read {
        /// File that failed
        path: String,
        /// Underlying I/O error
        source: io::Error,
    },
}

/// Built-in instructions for a platform
#[must_use]
pub const fn fallback_instructions(platform: Platform) -> &'static str {
    match platform {
        Platform::Twitter => TWITTER_INSTRUCTIONS,
        Platform::Discord | Platform::Other => CHAT_INSTRUCTIONS,
    }
}

/// Join instructions and knowledge into the final system prompt
#[must_use]
pub fn compose_system_prompt(instructions: &str, knowledge: &str) -> String {
    format!("{instructions}\n\nTAOFU KNOWLEDGE BASE:\n{knowledge}\n\n{REMINDER}")
}

/// The system prompt sent with every question
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemPrompt {
    text: String,
}

impl SystemPrompt {
    /// Compose a prompt from in-memory parts
    #[must_use]
    pub fn new(instructions: &str, knowledge: &str) -> Self {
        Self {
            text: compose_system_prompt(instructions, knowledge),
        }
    }

    /// Load instructions and knowledge from files, falling back to built-ins
    ///
    /// # Errors
    ///
    /// Returns `PromptError::Read` if a file exists but cannot be read.
    pub async fn load(
        instructions_path: &Path,
        knowledge_path: &Path,
        platform: Platform,
    ) -> Result<Self, PromptError> {
        let instructions = read_or_fallback(instructions_path, fallback_instructions(platform)).await?;
        let knowledge = read_or_fallback(knowledge_path, FALLBACK_KNOWLEDGE).await?;

        info!(
            instructions_chars = instructions.chars().count(),
            knowledge_chars = knowledge.chars().count(),
            "System prompt loaded"
        );

        Ok(Self::new(&instructions, &knowledge))
    }

    /// Prompt text
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.text
    }
}

async fn read_or_fallback(path: &Path, fallback: &str) -> Result<String, PromptError> {
    match tokio::fs::read_to_string(path).await {
        Ok(content) => Ok(content),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            warn!(path = %path.display(), "Prompt file not found, using built-in text");
            Ok(fallback.to_string())
        }
        Err(source) => Err(PromptError::Read {
            path: path.display().to_string(),
            source,
        }),
    }
}
