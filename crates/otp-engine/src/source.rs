//! SMS source contract consumed by the engine.

use async_trait::async_trait;
use thiserror::Error;

/// The newest inbound message for a number.
#[derive(Debug, Clone)]
pub struct InboundSms {
    pub sender: String,
    pub text: String,
}

#[derive(Error, Debug)]
pub enum SourceError {
    /// The source's auth session lapsed. Escalated to operators on a
    /// cooldown, not retried at tick frequency.
    #[error("SMS source session expired")]
    SessionExpired,

    /// Transient failure. Treated as "no OTP this tick".
    #[error("SMS source unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait SmsSource: Send + Sync {
    /// Fetch the newest message addressed to `number` inside the
    /// source's lookback window.
    async fn fetch_latest(&self, number: &str) -> Result<Option<InboundSms>, SourceError>;
}
