//! Pool data types.

use serde::{Deserialize, Serialize};

/// A leasable phone number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Number {
    /// Canonical digits, no formatting.
    pub value: String,
    /// Caller-chosen grouping key (e.g. a dialing prefix).
    pub country_code: String,
    /// Best-effort ISO-2 code, display only.
    #[serde(default)]
    pub detected_country: Option<String>,
}

impl Number {
    pub fn new(value: impl Into<String>, country_code: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            country_code: country_code.into(),
            detected_country: None,
        }
    }
}

/// Lease state of a pooled number. Retired numbers have no state:
/// they are removed from the pool entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LeaseState {
    Available,
    Leased,
}
