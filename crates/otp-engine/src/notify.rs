//! Delivery contract consumed by the engine.

use crate::session::DeliveryTarget;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug)]
#[error("{0}")]
pub struct NotifyError(pub String);

/// Session update delivery. Fire-and-forget from the engine's point of
/// view: failures are logged by the caller, never retried here.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Edit the session's status message in place.
    async fn update_lease(&self, target: &DeliveryTarget, text: &str) -> Result<(), NotifyError>;

    /// Push a standalone notification to a user's private chat.
    async fn send_direct(&self, user_id: i64, text: &str) -> Result<(), NotifyError>;
}
