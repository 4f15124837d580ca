//! Command implementations.

use std::io::{BufRead, Write};
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, bail};
use rand::Rng;
use rand::distributions::Alphanumeric;
use serde::Serialize;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use sentinel_core::{
    DeletionQueue, LedgerRepository, ProcessedEmail, ScanOutcome, ScheduledDeletion, TriageEngine,
    storage,
};
use sentinel_gemini::GeminiClassifier;
use sentinel_gmail::{AuthorizationFlow, GmailClient, OAuthClient, Provider, Token, extract_code};

use crate::config::{Config, MAX_FETCH_LIMIT, MAX_SCAN_INTERVAL_MINUTES};
use crate::credentials;

type Engine = TriageEngine<GmailClient, GeminiClassifier>;

/// Number of ledger entries shown by `status`.
const STATUS_RECENT: u32 = 10;

async fn open_repositories(config: &Config) -> anyhow::Result<(LedgerRepository, DeletionQueue)> {
    let pool = storage::open(&config.database_path)
        .await
        .with_context(|| format!("Failed to open {}", config.database_path.display()))?;
    let ledger = LedgerRepository::new(pool.clone()).await?;
    let deletions = DeletionQueue::new(pool).await?;
    Ok((ledger, deletions))
}

fn oauth_client(config: &Config) -> anyhow::Result<OAuthClient> {
    if config.gmail.client_id.is_empty() {
        bail!("gmail.client_id is not configured");
    }

    let mut client = OAuthClient::new(&config.gmail.client_id, Provider::google()?)
        .with_redirect_uri(&config.gmail.redirect_uri);
    if let Some(secret) = &config.gmail.client_secret {
        client = client.with_client_secret(secret);
    }
    Ok(client)
}

async fn build_engine(config: &Config) -> anyhow::Result<Engine> {
    let token = credentials::load_gmail_token()?
        .context("No Gmail token stored, run `inbox-sentinel login` first")?;
    let api_key = credentials::gemini_api_key()?.with_context(|| {
        format!(
            "No Gemini API key, set {} or run `inbox-sentinel login`",
            credentials::GEMINI_API_KEY_ENV
        )
    })?;

    let mailbox =
        GmailClient::new(oauth_client(config)?, token).with_api_base(&config.gmail.api_base);
    let classifier = GeminiClassifier::new(api_key)
        .with_model(&config.gemini.model)
        .with_api_base(&config.gemini.api_base);
    let (ledger, deletions) = open_repositories(config).await?;

    Ok(TriageEngine::new(mailbox, classifier, ledger, deletions)
        .with_settings(config.scan_settings()?))
}

/// Runs one scan and writes its JSON payload to stdout.
async fn scan_once(engine: &Engine, stored: &mut Token, limit: u32) -> anyhow::Result<ScanOutcome> {
    let outcome = engine.run_scan(limit).await;
    println!("{}", outcome.to_json()?);

    // Keep the keyring in step with refreshes done during the scan
    let current = engine.mailbox().token().await;
    if current != *stored {
        match credentials::store_gmail_token(&current) {
            Ok(()) => *stored = current,
            Err(e) => warn!("Failed to persist refreshed Gmail token: {e}"),
        }
    }

    Ok(outcome)
}

fn checked_limit(limit: Option<u32>, config: &Config) -> anyhow::Result<u32> {
    let limit = limit.unwrap_or(config.fetch_limit);
    if !(1..=MAX_FETCH_LIMIT).contains(&limit) {
        bail!("--limit must be between 1 and {MAX_FETCH_LIMIT}");
    }
    Ok(limit)
}

/// `scan`: one pass over the inbox.
pub async fn scan(config: &Config, limit: Option<u32>) -> anyhow::Result<ExitCode> {
    let limit = checked_limit(limit, config)?;
    let engine = build_engine(config).await?;
    let mut stored = engine.mailbox().token().await;

    let outcome = scan_once(&engine, &mut stored, limit).await?;
    Ok(if outcome.is_failure() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

fn watch_period(minutes: Option<u64>, config: &Config) -> anyhow::Result<(u64, Duration)> {
    let minutes = minutes.unwrap_or(config.scan_interval_minutes);
    if !(1..=MAX_SCAN_INTERVAL_MINUTES).contains(&minutes) {
        bail!("--interval-minutes must be between 1 and {MAX_SCAN_INTERVAL_MINUTES}");
    }
    let secs = minutes
        .checked_mul(60)
        .context("--interval-minutes is too large")?;
    Ok((minutes, Duration::from_secs(secs)))
}

/// `watch`: scan now and then every interval until Ctrl-C.
pub async fn watch(config: &Config, interval_minutes: Option<u64>) -> anyhow::Result<ExitCode> {
    let (minutes, period) = watch_period(interval_minutes, config)?;
    let limit = checked_limit(None, config)?;
    let engine = build_engine(config).await?;
    let mut stored = engine.mailbox().token().await;

    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    info!(interval_minutes = minutes, "Watching inbox");
    loop {
        tokio::select! {
            biased;
            _ = &mut shutdown => {
                info!("Shutting down");
                break;
            }
            _ = ticker.tick() => {}
        }

        scan_once(&engine, &mut stored, limit).await?;
    }

    Ok(ExitCode::SUCCESS)
}

fn prompt(question: &str) -> anyhow::Result<String> {
    eprint!("{question}");
    std::io::stderr().flush()?;

    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

/// `login`: authorize Gmail access and store the Gemini key.
pub async fn login(config: &Config) -> anyhow::Result<ExitCode> {
    let flow = AuthorizationFlow::new(oauth_client(config)?);
    let state: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(24)
        .map(char::from)
        .collect();

    eprintln!("Open this URL in a browser and grant access:\n\n{}\n", flow.authorization_url(&state)?);
    let pasted = prompt("Paste the URL you were redirected to (or the code): ")?;
    let code = extract_code(&pasted, &state)?;

    let token = flow
        .exchange_code(&code)
        .await
        .context("Authorization code exchange failed")?;
    if token.refresh_token.is_none() {
        warn!("No refresh token issued; access will stop when the token expires");
    }
    credentials::store_gmail_token(&token)?;
    eprintln!("Gmail access stored in the system keyring.");

    let api_key = prompt("Gemini API key (leave blank to keep the current one): ")?;
    if !api_key.is_empty() {
        credentials::store_gemini_api_key(&api_key)?;
        eprintln!("Gemini API key stored in the system keyring.");
    }

    Ok(ExitCode::SUCCESS)
}

#[derive(Debug, Serialize)]
struct Status {
    processed_count: u64,
    recent: Vec<ProcessedEmail>,
    pending_deletions: Vec<ScheduledDeletion>,
}

/// `status`: what the assistant has done so far.
pub async fn status(config: &Config) -> anyhow::Result<ExitCode> {
    let (ledger, deletions) = open_repositories(config).await?;

    let status = Status {
        processed_count: ledger.count().await?,
        recent: ledger.recent(STATUS_RECENT).await?,
        pending_deletions: deletions.pending().await?,
    };
    println!("{}", serde_json::to_string_pretty(&status)?);
    Ok(ExitCode::SUCCESS)
}
