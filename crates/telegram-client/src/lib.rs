//! Minimal Telegram Bot API client.
//!
//! Covers exactly what the lease bot needs: sending and editing
//! messages and a long-polling update stream. Keyboards and other UI
//! rendering are deliberately absent.

mod client;
mod error;
mod receiver;
mod types;

pub use client::TelegramClient;
pub use error::TelegramError;
pub use receiver::UpdateReceiver;
pub use types::{ApiResponse, BotMessage, Chat, Message, Update, User};
