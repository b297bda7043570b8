// File: giftbot-core/src/services/discord/prefix.rs
//
// Text commands: `!itemlist`, `!gift @user item [qty]`, `!addstock item codes...`.

use tracing::{debug, warn};
use twilight_model::channel::Message;
use twilight_model::channel::message::Mention;
use twilight_model::guild::Permissions;

use giftbot_common::models::normalize_item;

use crate::Error;
use crate::platforms::discord::notifier::build_embed;
use crate::services::GiftRequest;
use crate::services::discord::replies::{self, Reply};
use crate::services::discord::{user_tag, CommandContext};

/// Splits off the first whitespace-delimited word. The rest keeps its inner
/// line breaks so pasted code lists survive.
pub fn split_first_word(input: &str) -> (&str, &str) {
    let input = input.trim_start();
    match input.find(char::is_whitespace) {
        Some(idx) => (&input[..idx], input[idx..].trim()),
        None => (input, ""),
    }
}

/// Arguments after `!gift`: a mention, the item, and an optional quantity.
/// Unparseable or non-positive quantities fall back to 1.
pub fn parse_gift_args(args: &str) -> Option<(String, usize)> {
    let mut words = args.split_whitespace().filter(|w| !is_mention(w));
    let item = words.next()?;
    let quantity = words
        .next()
        .and_then(|q| q.parse::<i64>().ok())
        .map(|q| q.max(1) as usize)
        .unwrap_or(1);
    Some((normalize_item(item), quantity))
}

fn is_mention(word: &str) -> bool {
    word.starts_with("<@") && word.ends_with('>')
}

/// Administrator in the channel, or holding one of the configured
/// `admin_roles`. `permissions` is `None` when the cache cannot tell.
pub fn is_prefix_admin(
    permissions: Option<Permissions>,
    member_roles: &[String],
    admin_roles: &[String],
) -> bool {
    permissions.is_some_and(|p| p.contains(Permissions::ADMINISTRATOR))
        || member_roles.iter().any(|r| admin_roles.contains(r))
}

fn author_permissions(ctx: &CommandContext, msg: &Message) -> Option<Permissions> {
    match ctx.cache.permissions().in_channel(msg.author.id, msg.channel_id) {
        Ok(p) => Some(p),
        Err(e) => {
            debug!("No cached permissions for {} in {}: {e}", msg.author.id, msg.channel_id);
            None
        }
    }
}

fn mention_tag(m: &Mention) -> String {
    if m.discriminator == 0 {
        m.name.clone()
    } else {
        format!("{}#{:04}", m.name, m.discriminator)
    }
}

pub async fn handle_message(ctx: &CommandContext, msg: &Message) -> Result<(), Error> {
    let Some(body) = msg.content.strip_prefix(ctx.prefix.as_str()) else {
        return Ok(());
    };
    let (command, args) = split_first_word(body);
    let command = command.to_lowercase();
    debug!("Prefix command {}{command} from {}", ctx.prefix, msg.author.id);

    let reply = match command.as_str() {
        "itemlist" => Reply::embed(ctx.stock.summary().await),
        "gift" | "addstock" => {
            let roles: Vec<String> = msg
                .member
                .as_ref()
                .map(|m| m.roles.iter().map(|r| r.to_string()).collect())
                .unwrap_or_default();
            if msg.guild_id.is_none() {
                Reply::text(replies::GUILD_ONLY)
            } else if !is_prefix_admin(author_permissions(ctx, msg), &roles, &ctx.admin_roles) {
                Reply::text(replies::NOT_ADMIN)
            } else if command == "gift" {
                gift(ctx, msg, args).await
            } else {
                add_stock(ctx, msg, args).await
            }
        }
        _ => return Ok(()),
    };

    send_reply(ctx, msg, &reply).await
}

async fn gift(ctx: &CommandContext, msg: &Message, args: &str) -> Reply {
    let usage = format!("❗ Usage: {}gift @user item [quantity]", ctx.prefix);
    let Some(target) = msg.mentions.first() else {
        return Reply::text(usage);
    };
    let Some((item, quantity)) = parse_gift_args(args) else {
        return Reply::text(usage);
    };

    let request = GiftRequest {
        item,
        quantity: Some(quantity as i64),
        recipient_id: target.id.to_string(),
        sender: user_tag(&msg.author),
    };
    let result = ctx.gifts.distribute(&request).await;
    Reply::text(replies::gift_outcome(&result, &mention_tag(target)))
}

async fn add_stock(ctx: &CommandContext, msg: &Message, args: &str) -> Reply {
    let (item, inline) = split_first_word(args);
    if item.is_empty() {
        return Reply::text(format!("❗ Usage: {}addstock item code1, code2, ...", ctx.prefix));
    }

    let raw = if !inline.is_empty() {
        inline.to_string()
    } else {
        match fetch_txt_attachment(ctx, msg).await {
            Ok(Some(text)) => text,
            Ok(None) => return Reply::text(replies::NO_CODES),
            Err(e) => {
                warn!("Could not read attachment from {}: {e}", msg.author.id);
                return Reply::text(format!("❌ Could not read the attached file: {e}"));
            }
        }
    };

    match ctx.stock.add_stock(item, &raw).await {
        Ok(added) => Reply::text(replies::stock_added(&normalize_item(item), &added)),
        Err(e) => Reply::text(replies::add_stock_failed(&e)),
    }
}

async fn fetch_txt_attachment(ctx: &CommandContext, msg: &Message) -> Result<Option<String>, Error> {
    let Some(file) = msg
        .attachments
        .iter()
        .find(|a| a.filename.to_lowercase().ends_with(".txt"))
    else {
        return Ok(None);
    };
    let body = ctx
        .web
        .get(&file.url)
        .send()
        .await
        .and_then(|r| r.error_for_status())
        .map_err(|e| Error::Platform(e.to_string()))?
        .text()
        .await
        .map_err(|e| Error::Platform(e.to_string()))?;
    Ok(Some(body))
}

async fn send_reply(ctx: &CommandContext, msg: &Message, reply: &Reply) -> Result<(), Error> {
    let embeds = match &reply.embed {
        Some(content) => vec![build_embed(content)?],
        None => Vec::new(),
    };
    let mut request = ctx.http.create_message(msg.channel_id).reply(msg.id);
    if let Some(text) = reply.text.as_deref() {
        request = request.content(text);
    }
    if !embeds.is_empty() {
        request = request.embeds(&embeds);
    }
    request
        .await
        .map_err(|e| Error::Platform(format!("Error replying in {}: {e}", msg.channel_id)))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_first_word_keeps_newlines() {
        let (item, rest) = split_first_word("  Nitro  AAA,\nBBB\r\nCCC ");
        assert_eq!(item, "Nitro");
        assert_eq!(rest, "AAA,\nBBB\r\nCCC");

        assert_eq!(split_first_word("itemlist"), ("itemlist", ""));
        assert_eq!(split_first_word(""), ("", ""));
    }

    #[test]
    fn test_parse_gift_args() {
        assert_eq!(
            parse_gift_args("<@123> Nitro 3"),
            Some(("nitro".to_string(), 3))
        );
        assert_eq!(
            parse_gift_args("<@!123> nitro"),
            Some(("nitro".to_string(), 1))
        );
        assert_eq!(
            parse_gift_args("<@123> nitro lots"),
            Some(("nitro".to_string(), 1))
        );
        assert_eq!(
            parse_gift_args("<@123> nitro -4"),
            Some(("nitro".to_string(), 1))
        );
        assert_eq!(parse_gift_args("<@123>"), None);
    }

    #[test]
    fn test_prefix_admin_roles() {
        let admins = vec!["10".to_string(), "20".to_string()];
        assert!(is_prefix_admin(None, &["5".into(), "20".into()], &admins));
        assert!(!is_prefix_admin(None, &["5".into()], &admins));
        assert!(!is_prefix_admin(None, &[], &admins));
    }

    #[test]
    fn test_administrator_needs_no_configured_roles() {
        let none: Vec<String> = Vec::new();
        let admin = Permissions::ADMINISTRATOR | Permissions::SEND_MESSAGES;
        assert!(is_prefix_admin(Some(admin), &[], &none));
        assert!(!is_prefix_admin(Some(Permissions::SEND_MESSAGES), &["5".into()], &none));
        assert!(!is_prefix_admin(Some(Permissions::MANAGE_GUILD), &[], &none));
    }
}
