//! SMS source errors.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// The upstream session cookie expired and the endpoint now serves
    /// its login page. Needs operator attention, not a retry.
    #[error("Session expired - redirected to login page")]
    SessionExpired,
}
