//! Number Lease Bot - Main entry point.

mod adapters;
mod commands;
mod config;
mod error;

use crate::adapters::{CdrSource, TelegramNotifier};
use crate::config::Config;
use crate::error::AppResult;
use anyhow::Context;
use number_pool::MemoryPool;
use otp_engine::{LeaseEngine, OtpExtractor};
use sms_source::CdrClient;
use std::sync::Arc;
use telegram_client::{TelegramClient, UpdateReceiver};
use tokio::signal;
use tokio_stream::StreamExt;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> AppResult<()> {
    // Load configuration
    let config = Config::load().context("Failed to load configuration")?;

    // Initialize logging
    init_logging(&config.log_level);

    info!("Starting number lease bot...");

    // Initialize clients
    let telegram = TelegramClient::new(config.telegram.bot_token.clone())
        .context("Failed to create Telegram client")?;

    let cdr = CdrClient::new(
        &config.sms.base_url,
        config.sms.cookie.clone(),
        config.sms.lookback,
        config.sms.request_timeout,
    )
    .context("Failed to create CDR client")?;

    // Seed the number pool
    let pool = Arc::new(MemoryPool::new());
    if let Some(seed_file) = &config.pool.seed_file {
        let count = pool
            .load_seed(seed_file)
            .await
            .with_context(|| format!("Failed to load number seed from {}", seed_file.display()))?;
        info!("Loaded {} numbers from {}", count, seed_file.display());
    } else {
        warn!("No number seed file configured - pool starts empty");
    }

    if config.engine.admins.is_empty() {
        warn!("No admins configured - source auth alerts have nowhere to go");
    }

    let extractor = if config.otp_patterns.is_empty() {
        OtpExtractor::default()
    } else {
        let patterns: Vec<&str> = config.otp_patterns.iter().map(String::as_str).collect();
        OtpExtractor::new(&patterns).context("Invalid OTP pattern override")?
    };

    // Wire the engine
    let engine = LeaseEngine::new(
        pool,
        Arc::new(CdrSource::new(cdr)),
        Arc::new(TelegramNotifier::new(telegram.clone())),
        extractor,
        config.engine.clone(),
    );

    let sweeper = engine.spawn_sweeper();
    if sweeper.is_some() {
        info!(
            "Sweeper running every {:?} over the whole pool",
            config.engine.sweep.interval
        );
    }

    info!("CDR endpoint: {}", config.sms.base_url);
    info!("Listening for commands...");

    // Start update receiver
    let receiver = UpdateReceiver::new(telegram.clone(), config.telegram.poll_timeout);
    let mut stream = Box::pin(receiver.stream());

    // Main message loop
    loop {
        tokio::select! {
            Some(message) = stream.next() => {
                if let Err(e) = commands::dispatch(&engine, &telegram, &message).await {
                    error!("Command failed: {}", e);
                    let _ = telegram
                        .send_message(message.chat_id, "Sorry, something went wrong.")
                        .await;
                }
            }
            _ = signal::ctrl_c() => {
                info!("Shutdown signal received");
                break;
            }
        }
    }

    if let Some(handle) = sweeper {
        handle.abort();
    }

    info!("Shutting down...");
    Ok(())
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
