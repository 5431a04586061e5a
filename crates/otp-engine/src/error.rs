//! Engine errors.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Number {0} already has an active session")]
    AlreadyMonitored(String),
}
