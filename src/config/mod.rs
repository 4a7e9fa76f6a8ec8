//! Configuration module for Warden.
//!
//! Loads configuration from environment variables.

use std::env;
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::i18n;

/// Bot running mode
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BotMode {
    #[default]
    Polling,
    Webhook,
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    // Telegram
    pub bot_token: String,
    pub bot_mode: BotMode,
    pub webhook_url: Option<String>,
    pub webhook_port: u16,
    pub webhook_secret: Option<String>,

    /// Owner user IDs (comma-separated).
    /// These users are treated as chat owners everywhere.
    pub owner_ids: Vec<u64>,

    /// MongoDB. When no URI is set, state lives in process memory.
    pub mongodb_uri: Option<String>,
    pub mongodb_database: String,

    /// How often empty spam windows are swept.
    pub sweep_interval: Duration,

    /// Catalogue used for engine notices.
    pub locale: String,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let bot_mode = match env::var("BOT_MODE")
            .unwrap_or_else(|_| "polling".to_string())
            .to_lowercase()
            .as_str()
        {
            "webhook" => BotMode::Webhook,
            _ => BotMode::Polling,
        };

        let webhook_url = non_empty_var("WEBHOOK_URL");
        if bot_mode == BotMode::Webhook && webhook_url.is_none() {
            return Err(ConfigError::MissingEnvVar("WEBHOOK_URL".to_string()));
        }

        let webhook_port = match env::var("WEBHOOK_PORT") {
            Ok(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|e| ConfigError::invalid("WEBHOOK_PORT", e.to_string()))?,
            Err(_) => 8443,
        };

        let sweep_secs = match env::var("SWEEP_INTERVAL_SECS") {
            Ok(raw) => parse_positive("SWEEP_INTERVAL_SECS", &raw)?,
            Err(_) => 300,
        };

        let locale = env::var("BOT_LOCALE")
            .map(|l| l.trim().to_lowercase())
            .unwrap_or_else(|_| "ru".to_string());
        if !i18n::is_supported(&locale) {
            return Err(ConfigError::invalid("BOT_LOCALE", format!("no catalogue for '{}'", locale)));
        }

        Ok(Self {
            bot_token: non_empty_var("BOT_TOKEN")
                .ok_or_else(|| ConfigError::MissingEnvVar("BOT_TOKEN".to_string()))?,
            bot_mode,
            webhook_url,
            webhook_port,
            webhook_secret: non_empty_var("WEBHOOK_SECRET"),
            owner_ids: parse_owner_ids(&env::var("OWNER_IDS").unwrap_or_default()),
            mongodb_uri: non_empty_var("MONGODB_URI"),
            mongodb_database: env::var("MONGODB_DATABASE").unwrap_or_else(|_| "warden".to_string()),
            sweep_interval: Duration::from_secs(sweep_secs),
            locale,
        })
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Parse a comma-separated list of user IDs, skipping garbage entries.
pub fn parse_owner_ids(raw: &str) -> Vec<u64> {
    raw.split(',')
        .filter_map(|s| s.trim().parse::<u64>().ok())
        .collect()
}

fn parse_positive(key: &str, raw: &str) -> Result<u64, ConfigError> {
    match raw.trim().parse::<u64>() {
        Ok(0) => Err(ConfigError::invalid(key, "must be greater than zero")),
        Ok(v) => Ok(v),
        Err(e) => Err(ConfigError::invalid(key, e.to_string())),
    }
}
