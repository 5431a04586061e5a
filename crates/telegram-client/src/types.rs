//! Telegram Bot API types (the small subset the bot uses).

use serde::{Deserialize, Serialize};

/// Generic Bot API envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    pub description: Option<String>,
    pub result: Option<T>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub from: Option<User>,
    pub chat: Chat,
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: i64,
    pub first_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SendMessageRequest {
    pub chat_id: i64,
    pub text: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct EditMessageRequest {
    pub chat_id: i64,
    pub message_id: i64,
    pub text: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct GetUpdatesRequest {
    pub offset: i64,
    /// Long-poll timeout in seconds.
    pub timeout: u64,
    pub allowed_updates: Vec<String>,
}

/// Parsed inbound message for dispatch.
#[derive(Debug, Clone)]
pub struct BotMessage {
    /// Telegram id of the sender.
    pub user_id: i64,
    /// Chat the message arrived in.
    pub chat_id: i64,
    pub text: String,
}

impl BotMessage {
    /// Extract a dispatchable message from an update. Updates without
    /// text or without a sender are dropped.
    pub fn from_update(update: &Update) -> Option<Self> {
        let message = update.message.as_ref()?;
        let text = message.text.clone()?;
        let user = message.from.as_ref()?;

        Some(Self {
            user_id: user.id,
            chat_id: message.chat.id,
            text,
        })
    }
}
