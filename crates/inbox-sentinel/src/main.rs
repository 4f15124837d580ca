//! Inbox Sentinel - an inbox triage assistant.
//!
//! Reads unread Gmail, asks Gemini to classify each message, and acts on the
//! verdict: drafts replies, archives, batches low-priority mail into a digest,
//! and trashes one-time codes after a grace period.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod app;
mod config;
mod credentials;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use config::Config;

#[derive(Debug, Parser)]
#[command(name = "inbox-sentinel", version, about)]
struct Cli {
    /// Configuration file (defaults to the platform config directory).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run one scan and print the result as JSON.
    Scan {
        /// Maximum unread messages to fetch.
        #[arg(long)]
        limit: Option<u32>,
    },
    /// Scan now and then periodically until interrupted.
    Watch {
        /// Minutes between scans.
        #[arg(long)]
        interval_minutes: Option<u64>,
    },
    /// Authorize Gmail access and store the Gemini API key.
    Login,
    /// Show processed messages and pending deletions.
    Status,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    // Logs go to stderr, stdout carries the JSON results
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "inbox_sentinel=info,sentinel_core=info,sentinel_gmail=info,sentinel_gemini=info"
                    .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref()).await?;
    info!(database = %config.database_path.display(), "Starting Inbox Sentinel");

    match cli.command {
        Command::Scan { limit } => app::scan(&config, limit).await,
        Command::Watch { interval_minutes } => app::watch(&config, interval_minutes).await,
        Command::Login => app::login(&config).await,
        Command::Status => app::status(&config).await,
    }
}
