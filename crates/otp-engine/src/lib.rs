//! Number lease and OTP monitoring engine.
//!
//! Leases single-use phone numbers to concurrent requesters, watches
//! the SMS source until a one-time passcode arrives for each leased
//! number, then permanently retires that number. One cooperative task
//! per session drives the `Created -> Polling -> {Found, TimedOut,
//! Cancelled}` state machine; a lower-frequency sweeper scans the rest
//! of the pool as a safety net.
//!
//! External collaborators enter through three traits: [`SmsSource`]
//! (where messages come from), [`Notifier`] (where updates go) and
//! `number_pool::NumberPool` (where numbers live).

mod alert;
mod config;
mod engine;
mod error;
mod extract;
mod notify;
mod poller;
mod registry;
mod session;
mod source;
mod sweeper;

#[cfg(test)]
pub(crate) mod testutil;

pub use alert::AuthAlert;
pub use config::{AlertConfig, EngineConfig, SweepConfig};
pub use engine::LeaseEngine;
pub use error::EngineError;
pub use extract::{ExtractedOtp, OtpExtractor, DEFAULT_OTP_PATTERNS};
pub use notify::{Notifier, NotifyError};
pub use registry::SessionRegistry;
pub use session::{DeliveryTarget, Session, SessionInfo};
pub use source::{InboundSms, SmsSource, SourceError};
pub use sweeper::{SweepStats, Sweeper};
