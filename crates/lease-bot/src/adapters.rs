//! Bindings between the collaborator clients and the engine traits.

use async_trait::async_trait;
use otp_engine::{DeliveryTarget, InboundSms, Notifier, NotifyError, SmsSource};
use sms_source::CdrClient;
use telegram_client::TelegramClient;

/// Feeds the engine from the CDR endpoint.
pub struct CdrSource {
    client: CdrClient,
}

impl CdrSource {
    pub fn new(client: CdrClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SmsSource for CdrSource {
    async fn fetch_latest(
        &self,
        number: &str,
    ) -> Result<Option<InboundSms>, otp_engine::SourceError> {
        match self.client.fetch_latest(number).await {
            Ok(Some(sms)) => Ok(Some(InboundSms {
                sender: sms.sender,
                text: sms.text,
            })),
            Ok(None) => Ok(None),
            Err(sms_source::SourceError::SessionExpired) => {
                Err(otp_engine::SourceError::SessionExpired)
            }
            Err(err) => Err(otp_engine::SourceError::Unavailable(err.to_string())),
        }
    }
}

/// Delivers session updates over Telegram.
pub struct TelegramNotifier {
    client: TelegramClient,
}

impl TelegramNotifier {
    pub fn new(client: TelegramClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn update_lease(&self, target: &DeliveryTarget, text: &str) -> Result<(), NotifyError> {
        self.client
            .edit_message_text(target.chat_id, target.message_id, text)
            .await
            .map_err(|e| NotifyError(e.to_string()))
    }

    async fn send_direct(&self, user_id: i64, text: &str) -> Result<(), NotifyError> {
        self.client
            .send_message(user_id, text)
            .await
            .map(|_| ())
            .map_err(|e| NotifyError(e.to_string()))
    }
}
