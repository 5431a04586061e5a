//! Update receiver with long polling.

use crate::client::TelegramClient;
use crate::types::BotMessage;
use std::time::Duration;
use tokio::time::sleep;
use tokio_stream::Stream;
use tracing::{debug, error};

/// Log preview of a message body. Truncation counts chars, not bytes:
/// a fixed byte cut could land inside a multibyte char and panic.
fn preview(text: &str) -> &str {
    match text.char_indices().nth(50) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Streams inbound messages via `getUpdates` long polling.
pub struct UpdateReceiver {
    client: TelegramClient,
    poll_timeout: Duration,
}

impl UpdateReceiver {
    pub fn new(client: TelegramClient, poll_timeout: Duration) -> Self {
        Self {
            client,
            poll_timeout,
        }
    }

    /// Start receiving messages as an async stream.
    pub fn stream(self) -> impl Stream<Item = BotMessage> {
        async_stream::stream! {
            let mut offset = 0;
            loop {
                match self.client.get_updates(offset, self.poll_timeout).await {
                    Ok(updates) => {
                        for update in updates {
                            offset = offset.max(update.update_id + 1);
                            if let Some(message) = BotMessage::from_update(&update) {
                                debug!(
                                    "Received '{}' from {}",
                                    preview(&message.text),
                                    message.user_id
                                );
                                yield message;
                            }
                        }
                    }
                    Err(e) => {
                        error!("getUpdates failed: {}", e);
                        // Back off on error
                        sleep(Duration::from_secs(5)).await;
                    }
                }
            }
        }
    }
}
