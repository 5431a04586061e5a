//! Pool errors.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PoolError {
    #[error("Seed file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Seed parse error: {0}")]
    Parse(#[from] serde_json::Error),
}
