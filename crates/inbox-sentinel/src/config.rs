//! Configuration file.

use std::path::{Path, PathBuf};

use anyhow::{Context, ensure};
use serde::{Deserialize, Serialize};
use tracing::debug;

use sentinel_core::ScanSettings;

const APP_DIR: &str = "inbox-sentinel";

/// Largest batch a single scan may fetch.
pub const MAX_FETCH_LIMIT: u32 = 100;

/// Longest `watch` period (one week).
pub const MAX_SCAN_INTERVAL_MINUTES: u64 = 7 * 24 * 60;

/// Application settings read from `config.json`.
///
/// Every field has a default, so a missing file or a partial one is fine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// `SQLite` database holding the ledger and the deletion queue.
    pub database_path: PathBuf,
    /// Unread messages fetched per scan.
    pub fetch_limit: u32,
    /// Pause between classification calls.
    pub pacing_seconds: u64,
    /// Delay before a one-time-code message is trashed.
    pub otp_trash_delay_minutes: i64,
    /// Period of the `watch` scheduler.
    pub scan_interval_minutes: u64,
    /// Gmail API and OAuth client.
    pub gmail: GmailConfig,
    /// Gemini model.
    pub gemini: GeminiConfig,
}

/// Gmail settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GmailConfig {
    /// OAuth client id of the installed application.
    pub client_id: String,
    /// OAuth client secret of the installed application.
    pub client_secret: Option<String>,
    /// Redirect URI registered for the client.
    pub redirect_uri: String,
    /// Gmail API base URL.
    pub api_base: String,
}

/// Gemini settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeminiConfig {
    /// Model name.
    pub model: String,
    /// API base URL.
    pub api_base: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: default_data_dir().join("sentinel.db"),
            fetch_limit: 5,
            pacing_seconds: 2,
            otp_trash_delay_minutes: 1,
            scan_interval_minutes: 15,
            gmail: GmailConfig::default(),
            gemini: GeminiConfig::default(),
        }
    }
}

impl Default for GmailConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: None,
            redirect_uri: "http://localhost".to_string(),
            api_base: sentinel_gmail::DEFAULT_API_BASE.to_string(),
        }
    }
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            model: sentinel_gemini::DEFAULT_MODEL.to_string(),
            api_base: sentinel_gemini::DEFAULT_API_BASE.to_string(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

/// Default location of the configuration file.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
        .join("config.json")
}

impl Config {
    /// Load configuration from `path`, or from the default location.
    ///
    /// A missing file yields the defaults.
    pub async fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let path = path.map_or_else(default_config_path, Path::to_path_buf);

        let exists = tokio::fs::try_exists(&path)
            .await
            .with_context(|| format!("Failed to check {}", path.display()))?;

        let config = if exists {
            let contents = tokio::fs::read_to_string(&path)
                .await
                .with_context(|| format!("Failed to read {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Invalid configuration in {}", path.display()))?
        } else {
            debug!("No configuration at {}, using defaults", path.display());
            Self::default()
        };

        config.validate()?;
        Ok(config)
    }

    /// Check value ranges.
    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(
            (1..=MAX_FETCH_LIMIT).contains(&self.fetch_limit),
            "fetch_limit must be between 1 and {MAX_FETCH_LIMIT}, got {}",
            self.fetch_limit
        );
        ensure!(
            (1..=MAX_SCAN_INTERVAL_MINUTES).contains(&self.scan_interval_minutes),
            "scan_interval_minutes must be between 1 and {MAX_SCAN_INTERVAL_MINUTES}, got {}",
            self.scan_interval_minutes
        );
        ensure!(
            self.otp_trash_delay_minutes >= 0,
            "otp_trash_delay_minutes must not be negative"
        );
        Ok(())
    }

    /// Engine settings derived from this configuration.
    pub fn scan_settings(&self) -> anyhow::Result<ScanSettings> {
        Ok(ScanSettings::new(
            self.pacing_seconds,
            self.otp_trash_delay_minutes,
        )?)
    }
}
