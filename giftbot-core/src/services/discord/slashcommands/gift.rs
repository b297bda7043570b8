// File: giftbot-core/src/services/discord/slashcommands/gift.rs

use twilight_model::application::command::{Command, CommandType};
use twilight_model::application::interaction::Interaction;
use twilight_model::application::interaction::application_command::CommandData;
use twilight_model::guild::Permissions;
use twilight_util::builder::command::{CommandBuilder, IntegerBuilder, StringBuilder, UserBuilder};

use crate::services::GiftRequest;
use crate::services::discord::{user_tag, CommandContext};
use crate::services::discord::replies::{self, Reply};
use crate::services::discord::slashcommands::{caller_tag, integer_option, is_admin, string_option, user_option};

pub fn create_gift_command() -> Command {
    CommandBuilder::new("gift", "Send gift codes to a user by DM", CommandType::ChatInput)
        .default_member_permissions(Permissions::ADMINISTRATOR)
        .option(UserBuilder::new("target", "User who receives the gift").required(true))
        .option(StringBuilder::new("item", "Item to send").required(true))
        .option(IntegerBuilder::new("quantity", "How many codes (default 1)").min_value(1))
        .build()
}

pub async fn handle_gift(ctx: &CommandContext, interaction: &Interaction, data: &CommandData) -> Reply {
    if !is_admin(interaction) {
        return Reply::text(replies::NOT_ADMIN);
    }
    let Some(target) = user_option(data, "target") else {
        return Reply::text("❗ Pick a user to gift.");
    };
    let Some(item) = string_option(data, "item") else {
        return Reply::text("❗ Pick an item.");
    };

    let target_tag = data
        .resolved
        .as_ref()
        .and_then(|r| r.users.get(&target))
        .map(user_tag)
        .unwrap_or_else(|| format!("<@{target}>"));

    let request = GiftRequest {
        item: item.to_string(),
        quantity: integer_option(data, "quantity"),
        recipient_id: target.to_string(),
        sender: caller_tag(interaction),
    };
    let result = ctx.gifts.distribute(&request).await;
    Reply::text(replies::gift_outcome(&result, &target_tag))
}
