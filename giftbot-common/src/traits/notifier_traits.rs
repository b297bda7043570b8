use async_trait::async_trait;

use crate::error::Error;
use crate::models::content::{Delivered, MessageContent, Recipient};

/// Delivers content to a user (private) or a channel (public).
///
/// Gift distribution and the stockboards only see this trait, never the
/// concrete transport. An unreachable user is `Error::DeliveryUnavailable`.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn deliver(&self, recipient: &Recipient, content: &MessageContent) -> Result<Delivered, Error>;
}

/// The extra operations a stockboard needs to keep one message current.
///
/// Implementations classify failures as:
///   - `Error::LocationUnreachable` when the channel is gone or inaccessible
///   - `Error::ReferenceStale` when the message is gone but the channel is fine
///   - anything else (usually `Error::Platform`) for transient failures
#[async_trait]
pub trait MessageBoard: Notifier {
    async fn resolve_channel(&self, channel_id: &str) -> Result<(), Error>;

    async fn fetch_message(&self, channel_id: &str, message_id: &str) -> Result<(), Error>;

    async fn edit_message(
        &self,
        channel_id: &str,
        message_id: &str,
        content: &MessageContent,
    ) -> Result<(), Error>;
}
