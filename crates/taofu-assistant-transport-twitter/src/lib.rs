#![deny(missing_docs)]
//! Twitter transport adapter for the Taofu assistant.

/// Twitter API v2 client.
pub mod client;
/// Twitter transport configuration.
pub mod config;
/// Twitter runtime entrypoint.
pub mod runner;

pub use client::TwitterClient;
pub use config::{BotSettings, TwitterSettings};
