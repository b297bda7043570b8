// File: giftbot-core/src/platforms/discord/notifier.rs
//
// Notifier/MessageBoard on top of twilight-http. Discord error codes are
// mapped onto the gone/stale/transient split the stockboards rely on.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tracing::debug;
use twilight_http::Client as HttpClient;
use twilight_http::api_error::ApiError;
use twilight_http::error::ErrorType;
use twilight_model::channel::message::Embed;
use twilight_model::http::attachment::Attachment;
use twilight_model::id::Id;
use twilight_model::id::marker::{ChannelMarker, MessageMarker, UserMarker};
use twilight_model::util::Timestamp;
use twilight_util::builder::embed::{EmbedBuilder, EmbedFieldBuilder, EmbedFooterBuilder};

use giftbot_common::models::content::{Delivered, MessageContent, Recipient};
use giftbot_common::traits::{MessageBoard, Notifier};

use crate::Error;

const UNKNOWN_CHANNEL: u64 = 10003;
const UNKNOWN_MESSAGE: u64 = 10008;
const MISSING_ACCESS: u64 = 50001;
const CANNOT_MESSAGE_USER: u64 = 50007;

/// What a 404 without a recognised error code means for the call at hand.
#[derive(Clone, Copy)]
enum NotFound {
    Channel,
    Message,
    User,
}

fn classify(err: twilight_http::Error, not_found: NotFound, context: &str) -> Error {
    if let ErrorType::Response { error, status, .. } = err.kind() {
        let code = match error {
            ApiError::General(general) => Some(general.code),
            _ => None,
        };
        match code {
            Some(UNKNOWN_CHANNEL) | Some(MISSING_ACCESS) => {
                return Error::LocationUnreachable(context.to_string());
            }
            Some(UNKNOWN_MESSAGE) => return Error::ReferenceStale(context.to_string()),
            Some(CANNOT_MESSAGE_USER) => {
                return Error::DeliveryUnavailable(format!("{context}: user does not accept DMs"));
            }
            _ => {}
        }
        if status.get() == 404 {
            return match not_found {
                NotFound::Channel => Error::LocationUnreachable(context.to_string()),
                NotFound::Message => Error::ReferenceStale(context.to_string()),
                NotFound::User => Error::DeliveryUnavailable(format!("{context}: unknown user")),
            };
        }
    }
    Error::Platform(format!("{context}: {err}"))
}

fn parse_id<T>(raw: &str) -> Option<Id<T>> {
    raw.trim().parse::<u64>().ok().and_then(Id::new_checked)
}

fn channel_id(raw: &str) -> Result<Id<ChannelMarker>, Error> {
    parse_id(raw).ok_or_else(|| Error::LocationUnreachable(format!("invalid channel ID '{raw}'")))
}

fn message_id(raw: &str) -> Result<Id<MessageMarker>, Error> {
    parse_id(raw).ok_or_else(|| Error::ReferenceStale(format!("invalid message ID '{raw}'")))
}

fn user_id(raw: &str) -> Result<Id<UserMarker>, Error> {
    parse_id(raw).ok_or_else(|| Error::DeliveryUnavailable(format!("invalid user ID '{raw}'")))
}

/// Renders `MessageContent` as one Discord embed.
pub fn build_embed(content: &MessageContent) -> Result<Embed, Error> {
    let mut builder = EmbedBuilder::new();
    if let Some(title) = &content.title {
        builder = builder.title(title.clone());
    }
    if let Some(description) = &content.description {
        builder = builder.description(description.clone());
    }
    for f in &content.fields {
        let mut field = EmbedFieldBuilder::new(f.name.clone(), f.value.clone());
        if f.inline {
            field = field.inline();
        }
        builder = builder.field(field);
    }
    if let Some(footer) = &content.footer {
        builder = builder.footer(EmbedFooterBuilder::new(footer.clone()));
    }
    if content.timestamped {
        if let Ok(ts) = Timestamp::from_secs(Utc::now().timestamp()) {
            builder = builder.timestamp(ts);
        }
    }

    builder
        .validate()
        .map(|b| b.build())
        .map_err(|e| Error::Platform(format!("invalid embed: {e}")))
}

fn build_attachments(content: &MessageContent) -> Vec<Attachment> {
    content
        .attachment
        .iter()
        .enumerate()
        .map(|(i, a)| Attachment::from_bytes(a.filename.clone(), a.body.clone().into_bytes(), i as u64))
        .collect()
}

#[derive(Clone)]
pub struct DiscordNotifier {
    http: Arc<HttpClient>,
}

impl DiscordNotifier {
    pub fn new(http: Arc<HttpClient>) -> Self {
        Self { http }
    }

    async fn send_embed(
        &self,
        channel: Id<ChannelMarker>,
        embed: Embed,
        attachments: &[Attachment],
        not_found: NotFound,
    ) -> Result<Delivered, Error> {
        let context = format!("sending to channel {channel}");
        let mut request = self.http.create_message(channel).embeds(std::slice::from_ref(&embed));
        if !attachments.is_empty() {
            request = request.attachments(attachments);
        }
        let response = request
            .await
            .map_err(|e| classify(e, not_found, &context))?;
        let message = response
            .model()
            .await
            .map_err(|e| Error::Platform(format!("{context}: bad response: {e}")))?;

        Ok(Delivered {
            channel_id: message.channel_id.to_string(),
            message_id: message.id.to_string(),
        })
    }
}

#[async_trait]
impl Notifier for DiscordNotifier {
    async fn deliver(&self, recipient: &Recipient, content: &MessageContent) -> Result<Delivered, Error> {
        let embed = build_embed(content)?;
        let attachments = build_attachments(content);
        match recipient {
            Recipient::Channel(raw) => {
                self.send_embed(channel_id(raw)?, embed, &attachments, NotFound::Channel)
                    .await
            }
            Recipient::User(raw) => {
                let user = user_id(raw)?;
                let context = format!("opening DM with {user}");
                let dm = self
                    .http
                    .create_private_channel(user)
                    .await
                    .map_err(|e| classify(e, NotFound::User, &context))?
                    .model()
                    .await
                    .map_err(|e| Error::Platform(format!("{context}: bad response: {e}")))?;
                debug!("DM channel {} for user {}", dm.id, user);

                // A DM that exists but refuses messages is still "user unreachable".
                match self.send_embed(dm.id, embed, &attachments, NotFound::User).await {
                    Err(Error::LocationUnreachable(why)) => Err(Error::DeliveryUnavailable(why)),
                    other => other,
                }
            }
        }
    }
}

#[async_trait]
impl MessageBoard for DiscordNotifier {
    async fn resolve_channel(&self, channel_raw: &str) -> Result<(), Error> {
        let channel = channel_id(channel_raw)?;
        self.http
            .channel(channel)
            .await
            .map(|_| ())
            .map_err(|e| classify(e, NotFound::Channel, &format!("channel {channel}")))
    }

    async fn fetch_message(&self, channel_raw: &str, message_raw: &str) -> Result<(), Error> {
        let channel = channel_id(channel_raw)?;
        let message = message_id(message_raw)?;
        self.http
            .message(channel, message)
            .await
            .map(|_| ())
            .map_err(|e| classify(e, NotFound::Message, &format!("message {message} in {channel}")))
    }

    async fn edit_message(&self, channel_raw: &str, message_raw: &str, content: &MessageContent) -> Result<(), Error> {
        let channel = channel_id(channel_raw)?;
        let message = message_id(message_raw)?;
        let embed = build_embed(content)?;
        self.http
            .update_message(channel, message)
            .embeds(Some(std::slice::from_ref(&embed)))
            .await
            .map(|_| ())
            .map_err(|e| classify(e, NotFound::Message, &format!("editing message {message} in {channel}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ids() {
        assert!(channel_id("123456789012345678").is_ok());
        assert!(matches!(channel_id("general"), Err(Error::LocationUnreachable(_))));
        assert!(matches!(message_id("0"), Err(Error::ReferenceStale(_))));
        assert!(matches!(user_id(""), Err(Error::DeliveryUnavailable(_))));
    }

    #[test]
    fn test_build_embed_keeps_fields_in_order() {
        let content = MessageContent::titled("t")
            .field("Item", "gold", true)
            .field("Codes (1)", "x", false)
            .footer("f");
        let embed = build_embed(&content).unwrap();
        assert_eq!(embed.title.as_deref(), Some("t"));
        let names: Vec<&str> = embed.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["Item", "Codes (1)"]);
        assert!(embed.fields[0].inline);
        assert_eq!(embed.footer.map(|f| f.text), Some("f".to_string()));
    }

    #[test]
    fn test_large_gift_embed_passes_validation() {
        use crate::services::render::render_gift;

        for count in [1, 60, 100, 240, 2000] {
            let codes: Vec<String> = (0..count).map(|i| format!("GIFT-{i:05}-XXXXXXX")).collect();
            let content = render_gift("nitro", &codes, "admin");
            let embed = build_embed(&content).unwrap();
            assert!(embed.fields.iter().all(|f| f.value.chars().count() <= 1024));
            assert_eq!(build_attachments(&content).len(), usize::from(content.attachment.is_some()));
        }
    }
}
