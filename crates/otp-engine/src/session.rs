//! Monitoring session state.

use number_pool::Number;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Where session updates are delivered: the status message the poller
/// keeps editing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryTarget {
    pub chat_id: i64,
    pub message_id: i64,
}

/// One bounded-time watch over one number on behalf of one user.
///
/// Only the owning poller mutates a session; other tasks interact with
/// it solely through the cooperative stop flag.
#[derive(Debug)]
pub struct Session {
    /// Unique even when the same number is leased again later: the id
    /// embeds the creation timestamp.
    pub id: String,
    pub number: Number,
    pub owner: i64,
    pub target: DeliveryTarget,
    started_at: Instant,
    stop: AtomicBool,
    last_otp: Mutex<Option<String>>,
}

impl Session {
    pub fn new(number: Number, owner: i64, target: DeliveryTarget) -> Self {
        let id = format!(
            "{}-{}",
            number.value,
            chrono::Utc::now().timestamp_millis()
        );
        Self {
            id,
            number,
            owner,
            target,
            started_at: Instant::now(),
            stop: AtomicBool::new(false),
            last_otp: Mutex::new(None),
        }
    }

    /// Request cooperative cancellation. The poller observes the flag
    /// on its next tick; an in-flight query is allowed to finish.
    pub fn request_stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }

    /// Wall-clock time since session creation, independent of how many
    /// ticks have completed.
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Record an observed code. Returns `true` only when the code
    /// differs from the last one seen, so re-observing the same OTP on
    /// a later tick cannot re-trigger the found transition.
    pub async fn observe(&self, code: &str) -> bool {
        let mut last = self.last_otp.lock().await;
        if last.as_deref() == Some(code) {
            return false;
        }
        *last = Some(code.to_string());
        true
    }

    pub fn info(&self) -> SessionInfo {
        SessionInfo {
            id: self.id.clone(),
            number: self.number.clone(),
            owner: self.owner,
            target: self.target,
        }
    }
}

/// Snapshot of a session's identity, handed to callers that need to
/// message about it after cancellation.
#[derive(Debug, Clone)]
pub struct SessionInfo {
    pub id: String,
    pub number: Number,
    pub owner: i64,
    pub target: DeliveryTarget,
}
