//! taofu-analytics: inspect the question log written by the assistant.

use anyhow::{Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use taofu_assistant_core::analytics::report::{export_records, load_records, search, AnalyticsReport};
use taofu_assistant_core::config::AssistantSettings;
use tracing_subscriber::EnvFilter;

const DEFAULT_EXPORT_PATH: &str = "taofu_analytics_export.json";

#[derive(Parser)]
#[command(name = "taofu-analytics")]
#[command(about = "Analyze questions and user engagement from the assistant's question log", long_about = None)]
#[command(version)]
struct Cli {
    /// Question log to read (defaults to the configured `analytics_path`).
    #[arg(short, long, global = true)]
    file: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the full analytics report (default).
    Report,
    /// List questions containing a term (case-insensitive).
    Search { term: String },
    /// Export all records as a pretty-printed JSON array.
    Export {
        #[arg(default_value = DEFAULT_EXPORT_PATH)]
        path: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let file = cli.file.unwrap_or_else(|| {
        AssistantSettings::new()
            .unwrap_or_default()
            .analytics_path
    });

    let records = load_records(&file)
        .await
        .with_context(|| format!("Failed to read {}", file.display()))?;

    if records.is_empty() {
        println!("No analytics data found. Run the bot first to collect data.");
        return Ok(());
    }

    match cli.command.unwrap_or(Commands::Report) {
        Commands::Report => {
            print!("{}", AnalyticsReport::build(&records, Local::now().naive_local()));
        }
        Commands::Search { term } => {
            let matching = search(&records, &term);
            if matching.is_empty() {
                println!("No questions found containing '{term}'");
            } else {
                println!("Found {} questions containing '{term}':", matching.len());
                for record in matching {
                    println!(
                        "  [{}] {} ({}): \"{}\"",
                        record.timestamp.format("%Y-%m-%d %H:%M"),
                        record.username,
                        record.platform,
                        record.question
                    );
                }
            }
        }
        Commands::Export { path } => {
            export_records(&records, &path)
                .await
                .with_context(|| format!("Failed to export to {}", path.display()))?;
            println!("Data exported to {}", path.display());
        }
    }

    Ok(())
}
