//! Hand-rolled collaborator doubles shared by the engine tests.

use crate::notify::{Notifier, NotifyError};
use crate::session::DeliveryTarget;
use crate::source::{InboundSms, SmsSource, SourceError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// What a scripted source should answer for a given number.
#[derive(Clone)]
pub(crate) enum Scripted {
    Silent,
    Sms { sender: String, text: String },
    Expired,
    Down,
}

impl Scripted {
    pub(crate) fn sms(sender: &str, text: &str) -> Self {
        Self::Sms {
            sender: sender.into(),
            text: text.into(),
        }
    }
}

/// SMS source double with per-number scripted replies.
#[derive(Default)]
pub(crate) struct ScriptedSource {
    replies: Mutex<HashMap<String, Scripted>>,
    pub(crate) calls: AtomicUsize,
}

impl ScriptedSource {
    pub(crate) fn set(&self, number: &str, reply: Scripted) {
        self.replies
            .lock()
            .unwrap()
            .insert(number.to_string(), reply);
    }
}

#[async_trait]
impl SmsSource for ScriptedSource {
    async fn fetch_latest(&self, number: &str) -> Result<Option<InboundSms>, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let reply = self
            .replies
            .lock()
            .unwrap()
            .get(number)
            .cloned()
            .unwrap_or(Scripted::Silent);

        match reply {
            Scripted::Silent => Ok(None),
            Scripted::Sms { sender, text } => Ok(Some(InboundSms { sender, text })),
            Scripted::Expired => Err(SourceError::SessionExpired),
            Scripted::Down => Err(SourceError::Unavailable("connection refused".into())),
        }
    }
}

/// Notifier double that records every delivery.
#[derive(Default)]
pub(crate) struct RecordingNotifier {
    pub(crate) lease_updates: Mutex<Vec<(DeliveryTarget, String)>>,
    pub(crate) directs: Mutex<Vec<(i64, String)>>,
}

impl RecordingNotifier {
    pub(crate) fn directs_to(&self, user: i64) -> Vec<String> {
        self.directs
            .lock()
            .unwrap()
            .iter()
            .filter(|(id, _)| *id == user)
            .map(|(_, text)| text.clone())
            .collect()
    }

    pub(crate) fn lease_update_count(&self) -> usize {
        self.lease_updates.lock().unwrap().len()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn update_lease(&self, target: &DeliveryTarget, text: &str) -> Result<(), NotifyError> {
        self.lease_updates
            .lock()
            .unwrap()
            .push((*target, text.to_string()));
        Ok(())
    }

    async fn send_direct(&self, user_id: i64, text: &str) -> Result<(), NotifyError> {
        self.directs
            .lock()
            .unwrap()
            .push((user_id, text.to_string()));
        Ok(())
    }
}
