//! Engine configuration.

use serde::Deserialize;
use std::time::Duration;

/// Timing and escalation knobs for the lease engine.
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// Interval between poller ticks.
    #[serde(default = "default_poll_interval", with = "humantime_serde")]
    pub poll_interval: Duration,

    /// Wall-clock session bound, measured from session creation.
    #[serde(default = "default_session_timeout", with = "humantime_serde")]
    pub session_timeout: Duration,

    /// Background sweeper settings.
    #[serde(default)]
    pub sweep: SweepConfig,

    /// Auth-expiry escalation settings.
    #[serde(default)]
    pub alert: AlertConfig,

    /// Operator chat ids, notified on sweeper retirements and source
    /// auth expiry.
    #[serde(default)]
    pub admins: Vec<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SweepConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Pause between full pool scans.
    #[serde(default = "default_sweep_interval", with = "humantime_serde")]
    pub interval: Duration,

    /// Pause between per-number source queries within one scan, so a
    /// large pool does not hammer the source.
    #[serde(default = "default_check_delay", with = "humantime_serde")]
    pub check_delay: Duration,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AlertConfig {
    /// Minimum gap between operator alerts for an expired source
    /// session.
    #[serde(default = "default_alert_cooldown", with = "humantime_serde")]
    pub cooldown: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            poll_interval: default_poll_interval(),
            session_timeout: default_session_timeout(),
            sweep: SweepConfig::default(),
            alert: AlertConfig::default(),
            admins: Vec::new(),
        }
    }
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            interval: default_sweep_interval(),
            check_delay: default_check_delay(),
        }
    }
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            cooldown: default_alert_cooldown(),
        }
    }
}

fn default_poll_interval() -> Duration {
    Duration::from_secs(5)
}

fn default_session_timeout() -> Duration {
    Duration::from_secs(120)
}

fn default_sweep_interval() -> Duration {
    Duration::from_secs(60)
}

fn default_check_delay() -> Duration {
    Duration::from_secs(1)
}

fn default_alert_cooldown() -> Duration {
    Duration::from_secs(600)
}

fn default_true() -> bool {
    true
}
