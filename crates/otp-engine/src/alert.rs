//! Cooldown-gated operator escalation for source auth expiry.

use crate::notify::Notifier;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, warn};

const ALERT_TEXT: &str =
    "SMS source session expired - the session cookie needs to be refreshed before codes can be read again.";

/// Gates the "source session expired" alert so operators hear about it
/// once per cooldown window rather than once per poll tick.
pub struct AuthAlert {
    cooldown: Duration,
    admins: Vec<i64>,
    last_alert: Mutex<Option<Instant>>,
}

impl AuthAlert {
    pub fn new(cooldown: Duration, admins: Vec<i64>) -> Self {
        Self {
            cooldown,
            admins,
            last_alert: Mutex::new(None),
        }
    }

    /// Report an expired source session. Sends at most one operator
    /// notification per cooldown window.
    pub async fn escalate(&self, notifier: &dyn Notifier) {
        {
            let mut last = self.last_alert.lock().await;
            let due = last.map_or(true, |at| at.elapsed() >= self.cooldown);
            if !due {
                debug!("Source session still expired, alert suppressed by cooldown");
                return;
            }
            *last = Some(Instant::now());
        }

        warn!("SMS source session expired, alerting operators");
        for admin in &self.admins {
            if let Err(e) = notifier.send_direct(*admin, ALERT_TEXT).await {
                warn!("Failed to alert operator {}: {}", admin, e);
            }
        }
    }
}
