// File: giftbot-core/src/test_utils/helpers.rs

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use giftbot_common::models::content::{Delivered, MessageContent, Recipient};
use giftbot_common::traits::{MessageBoard, Notifier};

use crate::Error;

/// In-memory stand-in for Discord: channels hold messages, users accept or
/// refuse DMs, and any call can be told to fail transiently.
#[derive(Default)]
pub struct FakeDiscord {
    /// channel ID -> (message ID -> latest content)
    channels: Mutex<HashMap<String, HashMap<String, MessageContent>>>,
    sent: Mutex<Vec<(Recipient, MessageContent)>>,
    next_id: AtomicU64,
    edits: AtomicUsize,
    dms_closed: AtomicBool,
    transient: AtomicBool,
    /// Milliseconds every `deliver` waits before answering.
    latency_ms: AtomicU64,
}

impl FakeDiscord {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1000),
            ..Default::default()
        }
    }

    pub async fn add_channel(&self, channel_id: &str) {
        self.channels
            .lock()
            .await
            .entry(channel_id.to_string())
            .or_default();
    }

    /// Seeds an existing message, as if posted before the bot restarted.
    pub async fn add_message(&self, channel_id: &str, message_id: &str) {
        self.channels
            .lock()
            .await
            .entry(channel_id.to_string())
            .or_default()
            .insert(message_id.to_string(), MessageContent::default());
    }

    pub async fn delete_channel(&self, channel_id: &str) {
        self.channels.lock().await.remove(channel_id);
    }

    pub async fn delete_message(&self, channel_id: &str, message_id: &str) {
        if let Some(msgs) = self.channels.lock().await.get_mut(channel_id) {
            msgs.remove(message_id);
        }
    }

    pub async fn message(&self, channel_id: &str, message_id: &str) -> Option<MessageContent> {
        self.channels
            .lock()
            .await
            .get(channel_id)
            .and_then(|m| m.get(message_id).cloned())
    }

    pub async fn message_ids(&self, channel_id: &str) -> Vec<String> {
        let mut ids: Vec<String> = self
            .channels
            .lock()
            .await
            .get(channel_id)
            .map(|m| m.keys().cloned().collect())
            .unwrap_or_default();
        ids.sort();
        ids
    }

    pub async fn sent(&self) -> Vec<(Recipient, MessageContent)> {
        self.sent.lock().await.clone()
    }

    pub fn edit_count(&self) -> usize {
        self.edits.load(Ordering::SeqCst)
    }

    pub fn set_dms_closed(&self, closed: bool) {
        self.dms_closed.store(closed, Ordering::SeqCst);
    }

    /// While set, every call fails with a non-drift platform error.
    pub fn set_transient_failure(&self, failing: bool) {
        self.transient.store(failing, Ordering::SeqCst);
    }

    /// Makes every `deliver` take at least `latency`.
    pub fn set_latency(&self, latency: Duration) {
        self.latency_ms.store(latency.as_millis() as u64, Ordering::SeqCst);
    }

    fn check_transient(&self) -> Result<(), Error> {
        if self.transient.load(Ordering::SeqCst) {
            Err(Error::Platform("503 Service Unavailable".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl Notifier for FakeDiscord {
    async fn deliver(&self, recipient: &Recipient, content: &MessageContent) -> Result<Delivered, Error> {
        let latency = self.latency_ms.load(Ordering::SeqCst);
        if latency > 0 {
            tokio::time::sleep(Duration::from_millis(latency)).await;
        }
        self.check_transient()?;
        let message_id = self.next_id.fetch_add(1, Ordering::SeqCst).to_string();
        let channel_id = match recipient {
            Recipient::User(user_id) => {
                if self.dms_closed.load(Ordering::SeqCst) {
                    return Err(Error::DeliveryUnavailable(format!("user {user_id} does not accept DMs")));
                }
                format!("dm-{user_id}")
            }
            Recipient::Channel(channel_id) => {
                let mut channels = self.channels.lock().await;
                let Some(msgs) = channels.get_mut(channel_id) else {
                    return Err(Error::LocationUnreachable(format!("channel {channel_id}")));
                };
                msgs.insert(message_id.clone(), content.clone());
                channel_id.clone()
            }
        };
        self.sent.lock().await.push((recipient.clone(), content.clone()));
        Ok(Delivered {
            channel_id,
            message_id,
        })
    }
}

#[async_trait]
impl MessageBoard for FakeDiscord {
    async fn resolve_channel(&self, channel_id: &str) -> Result<(), Error> {
        self.check_transient()?;
        if self.channels.lock().await.contains_key(channel_id) {
            Ok(())
        } else {
            Err(Error::LocationUnreachable(format!("channel {channel_id}")))
        }
    }

    async fn fetch_message(&self, channel_id: &str, message_id: &str) -> Result<(), Error> {
        self.check_transient()?;
        match self.channels.lock().await.get(channel_id) {
            None => Err(Error::LocationUnreachable(format!("channel {channel_id}"))),
            Some(msgs) if msgs.contains_key(message_id) => Ok(()),
            Some(_) => Err(Error::ReferenceStale(format!("message {message_id}"))),
        }
    }

    async fn edit_message(
        &self,
        channel_id: &str,
        message_id: &str,
        content: &MessageContent,
    ) -> Result<(), Error> {
        self.check_transient()?;
        let mut channels = self.channels.lock().await;
        let msgs = channels
            .get_mut(channel_id)
            .ok_or_else(|| Error::LocationUnreachable(format!("channel {channel_id}")))?;
        let slot = msgs
            .get_mut(message_id)
            .ok_or_else(|| Error::ReferenceStale(format!("message {message_id}")))?;
        *slot = content.clone();
        self.edits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
