//! Telegram Bot API HTTP client.

use crate::error::TelegramError;
use crate::types::*;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, instrument};

const DEFAULT_API_URL: &str = "https://api.telegram.org";

/// Thin Bot API client: send, edit, long-poll. No UI concerns.
#[derive(Clone)]
pub struct TelegramClient {
    client: Client,
    base_url: String,
    token: SecretString,
}

impl TelegramClient {
    pub fn new(token: SecretString) -> Result<Self, TelegramError> {
        Self::with_base_url(token, DEFAULT_API_URL)
    }

    /// Point the client at a different API host (tests).
    pub fn with_base_url(
        token: SecretString,
        base_url: impl Into<String>,
    ) -> Result<Self, TelegramError> {
        // Long polls run up to 30s; leave headroom over that.
        let client = Client::builder()
            .timeout(Duration::from_secs(40))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            token,
        })
    }

    async fn call<R, T>(&self, method: &str, request: &R) -> Result<T, TelegramError>
    where
        R: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = format!(
            "{}/bot{}/{}",
            self.base_url,
            self.token.expose_secret(),
            method
        );

        let response: ApiResponse<T> = self
            .client
            .post(url)
            .json(request)
            .send()
            .await?
            .json()
            .await?;

        if !response.ok {
            return Err(TelegramError::Api(
                response
                    .description
                    .unwrap_or_else(|| "unknown API error".into()),
            ));
        }
        response
            .result
            .ok_or_else(|| TelegramError::Api("missing result".into()))
    }

    /// Send a message, returning the created message.
    #[instrument(skip(self, text))]
    pub async fn send_message(&self, chat_id: i64, text: &str) -> Result<Message, TelegramError> {
        let message: Message = self
            .call(
                "sendMessage",
                &SendMessageRequest {
                    chat_id,
                    text: text.to_string(),
                },
            )
            .await?;
        debug!("Sent message {} to chat {}", message.message_id, chat_id);
        Ok(message)
    }

    /// Edit a previously sent message in place.
    #[instrument(skip(self, text))]
    pub async fn edit_message_text(
        &self,
        chat_id: i64,
        message_id: i64,
        text: &str,
    ) -> Result<(), TelegramError> {
        let _: Message = self
            .call(
                "editMessageText",
                &EditMessageRequest {
                    chat_id,
                    message_id,
                    text: text.to_string(),
                },
            )
            .await?;
        Ok(())
    }

    /// Long-poll for updates after `offset`.
    pub async fn get_updates(
        &self,
        offset: i64,
        timeout: Duration,
    ) -> Result<Vec<Update>, TelegramError> {
        self.call(
            "getUpdates",
            &GetUpdatesRequest {
                offset,
                timeout: timeout.as_secs(),
                allowed_updates: vec!["message".into()],
            },
        )
        .await
    }
}
