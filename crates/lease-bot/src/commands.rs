//! Command dispatch for inbound chat messages.

use crate::error::AppResult;
use otp_engine::{DeliveryTarget, LeaseEngine};
use telegram_client::{BotMessage, TelegramClient};
use tracing::{info, warn};

const HELP_TEXT: &str = "Number lease bot\n\n\
    /number <country> - lease a number and watch it for a code\n\
    /status - list your active watches\n\
    /cancel - cancel all your watches and return the numbers\n\
    /start - this help";

/// Parsed command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Number { country_code: String },
    Cancel,
    Status,
    Help,
}

impl Command {
    /// Parse a message text. Anything unrecognized maps to help,
    /// including `/number` without a country.
    pub fn parse(text: &str) -> Self {
        let mut parts = text.trim().split_whitespace();
        match parts.next() {
            Some("/number") => match parts.next() {
                Some(country) => Command::Number {
                    country_code: country.to_string(),
                },
                None => Command::Help,
            },
            Some("/cancel") => Command::Cancel,
            Some("/status") => Command::Status,
            _ => Command::Help,
        }
    }
}

/// Handle one inbound message end to end.
pub async fn dispatch(
    engine: &LeaseEngine,
    telegram: &TelegramClient,
    message: &BotMessage,
) -> AppResult<()> {
    match Command::parse(&message.text) {
        Command::Number { country_code } => {
            lease_number(engine, telegram, message, &country_code).await
        }
        Command::Cancel => cancel_all(engine, telegram, message).await,
        Command::Status => status(engine, telegram, message).await,
        Command::Help => {
            telegram.send_message(message.chat_id, HELP_TEXT).await?;
            Ok(())
        }
    }
}

async fn lease_number(
    engine: &LeaseEngine,
    telegram: &TelegramClient,
    message: &BotMessage,
    country_code: &str,
) -> AppResult<()> {
    // Prior sessions keep running: users may watch several numbers at
    // once.
    let Some(number) = engine.claim(country_code).await else {
        telegram
            .send_message(
                message.chat_id,
                &format!(
                    "No numbers available for {} right now. Try another country.",
                    country_code
                ),
            )
            .await?;
        return Ok(());
    };

    let text = format!(
        "Country: {}\nNumber: {}\n\nWatching for a code...",
        number
            .detected_country
            .as_deref()
            .unwrap_or(&number.country_code),
        number.value
    );
    let sent = telegram.send_message(message.chat_id, &text).await?;

    let target = DeliveryTarget {
        chat_id: message.chat_id,
        message_id: sent.message_id,
    };
    if let Err(e) = engine
        .start_session(number.clone(), message.user_id, target)
        .await
    {
        // Exclusive claims make this unreachable in practice, but a
        // claimed number must not leak if it ever happens.
        warn!("Could not start session for {}: {}", number.value, e);
        engine.unclaim(&number.value).await;
        telegram
            .send_message(message.chat_id, "That number is busy, try again.")
            .await?;
        return Ok(());
    }

    info!(
        "Leased {} to user {} in chat {}",
        number.value, message.user_id, message.chat_id
    );
    Ok(())
}

async fn cancel_all(
    engine: &LeaseEngine,
    telegram: &TelegramClient,
    message: &BotMessage,
) -> AppResult<()> {
    let cancelled = engine.cancel_all_for_user(message.user_id).await;

    let reply = if cancelled.is_empty() {
        "You have no active watches.".to_string()
    } else {
        format!(
            "Cancelled {} watch(es). The numbers are back in the pool.",
            cancelled.len()
        )
    };
    telegram.send_message(message.chat_id, &reply).await?;
    Ok(())
}

async fn status(
    engine: &LeaseEngine,
    telegram: &TelegramClient,
    message: &BotMessage,
) -> AppResult<()> {
    let sessions = engine.registry().sessions_for_user(message.user_id).await;

    let reply = if sessions.is_empty() {
        "You have no active watches.".to_string()
    } else {
        let mut lines = vec![format!("{} active watch(es):", sessions.len())];
        for session in sessions {
            lines.push(format!(
                "{} - watching for {}s",
                session.number.value,
                session.elapsed().as_secs()
            ));
        }
        lines.join("\n")
    };
    telegram.send_message(message.chat_id, &reply).await?;
    Ok(())
}
