//! Application configuration loaded from file and environment.

use anyhow::{Context, Result};
use otp_engine::EngineConfig;
use secrecy::SecretString;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Telegram delivery configuration
    pub telegram: TelegramConfig,

    /// SMS CDR source configuration
    pub sms: SmsConfig,

    /// Lease engine configuration
    #[serde(default)]
    pub engine: EngineConfig,

    /// Number pool configuration
    #[serde(default)]
    pub pool: PoolConfig,

    /// Ordered OTP pattern override. Order is a behavioral contract:
    /// the first matching pattern wins. Empty means the built-in list.
    #[serde(default)]
    pub otp_patterns: Vec<String>,

    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelegramConfig {
    /// Bot API token
    pub bot_token: SecretString,

    /// getUpdates long-poll timeout
    #[serde(default = "default_poll_timeout", with = "humantime_serde")]
    pub poll_timeout: Duration,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SmsConfig {
    /// CDR endpoint base URL
    pub base_url: String,

    /// Session cookie for the CDR endpoint
    pub cookie: SecretString,

    /// How far back to look for messages
    #[serde(default = "default_lookback", with = "humantime_serde")]
    pub lookback: Duration,

    /// Per-call deadline, independent of the session timeout
    #[serde(default = "default_request_timeout", with = "humantime_serde")]
    pub request_timeout: Duration,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PoolConfig {
    /// Optional JSON seed file with the initial number inventory.
    #[serde(default)]
    pub seed_file: Option<PathBuf>,
}

fn default_poll_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_lookback() -> Duration {
    Duration::from_secs(24 * 60 * 60)
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(15)
}

fn default_log_level() -> String {
    "info".into()
}

impl Config {
    /// Load configuration from an optional `config` file plus
    /// environment variables.
    pub fn load() -> Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(config::File::with_name("config").required(false))
            .add_source(
                config::Environment::default()
                    .separator("__")
                    // Phone numbers and tokens must stay strings;
                    // try_parsing would mangle values like +591...
                    .try_parsing(false),
            )
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_applies_defaults() {
        let raw = serde_json::json!({
            "telegram": {"bot_token": "123:ABC"},
            "sms": {
                "base_url": "http://cdr.example",
                "cookie": "PHPSESSID=abc"
            }
        });

        let config: Config = serde_json::from_value(raw).unwrap();

        assert_eq!(config.log_level, "info");
        assert_eq!(config.telegram.poll_timeout, Duration::from_secs(30));
        assert_eq!(config.sms.request_timeout, Duration::from_secs(15));
        assert_eq!(config.sms.lookback, Duration::from_secs(86400));
        assert_eq!(config.engine.poll_interval, Duration::from_secs(5));
        assert_eq!(config.engine.session_timeout, Duration::from_secs(120));
        assert_eq!(config.engine.sweep.interval, Duration::from_secs(60));
        assert!(config.engine.admins.is_empty());
        assert!(config.pool.seed_file.is_none());
        assert!(config.otp_patterns.is_empty());
    }

    #[test]
    fn durations_accept_humantime_strings() {
        let raw = serde_json::json!({
            "telegram": {"bot_token": "123:ABC", "poll_timeout": "10s"},
            "sms": {
                "base_url": "http://cdr.example",
                "cookie": "PHPSESSID=abc",
                "lookback": "6h"
            },
            "engine": {"session_timeout": "2m", "admins": [42]}
        });

        let config: Config = serde_json::from_value(raw).unwrap();

        assert_eq!(config.telegram.poll_timeout, Duration::from_secs(10));
        assert_eq!(config.sms.lookback, Duration::from_secs(6 * 3600));
        assert_eq!(config.engine.session_timeout, Duration::from_secs(120));
        assert_eq!(config.engine.admins, vec![42]);
    }
}
