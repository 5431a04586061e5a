//! Application error types.

use thiserror::Error;

/// Main application error type.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] anyhow::Error),

    #[error("Telegram error: {0}")]
    Telegram(#[from] telegram_client::TelegramError),

    #[error("SMS source error: {0}")]
    Source(#[from] sms_source::SourceError),

    #[error("Pool error: {0}")]
    Pool(#[from] number_pool::PoolError),

    #[error("Engine error: {0}")]
    Engine(#[from] otp_engine::EngineError),
}

/// Result type alias for application errors.
pub type AppResult<T> = Result<T, AppError>;
