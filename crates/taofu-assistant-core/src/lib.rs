#![deny(missing_docs)]
//! Taofu assistant core library.
//!
//! Mention filtering, reply shaping, the reply ledger and the polling loop that
//! ties them to a completion provider and a social platform client.

/// Question log and offline reporting.
pub mod analytics;
/// Configuration management.
pub mod config;
/// Persisted set of handled mention ids.
pub mod ledger;
/// Completion providers.
pub mod llm;
/// Text normalization, classification and reply shaping.
pub mod pipeline;
/// Mention polling loop.
pub mod poller;
/// System prompt composition.
pub mod prompt;
/// Social platform types and client interface.
pub mod social;

/// Mock constructors for unit tests.
#[cfg(test)]
pub mod testing;
