//! Client for the third-party SMS CDR endpoint.
//!
//! The endpoint speaks the legacy DataTables protocol: a large query
//! parameter grid in, positional JSON rows out, with aggregate rows
//! mixed into the data and an HTML login page served once the session
//! cookie expires. This crate hides all of that behind
//! [`CdrClient::fetch_latest`].

mod client;
mod error;
mod types;

pub use client::CdrClient;
pub use error::SourceError;
pub use types::{CdrResponse, SmsMessage};
