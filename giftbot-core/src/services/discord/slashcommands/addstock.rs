// File: giftbot-core/src/services/discord/slashcommands/addstock.rs

use twilight_model::application::command::{Command, CommandType};
use twilight_model::application::interaction::Interaction;
use twilight_model::application::interaction::application_command::CommandData;
use twilight_model::guild::Permissions;
use twilight_util::builder::command::{CommandBuilder, StringBuilder};

use giftbot_common::models::normalize_item;

use crate::services::discord::CommandContext;
use crate::services::discord::replies::{self, Reply};
use crate::services::discord::slashcommands::{is_admin, string_option};

pub fn create_addstock_command() -> Command {
    CommandBuilder::new(
        "addstock",
        "Add codes to an item (separate codes with commas or new lines)",
        CommandType::ChatInput,
    )
    .default_member_permissions(Permissions::ADMINISTRATOR)
    .option(StringBuilder::new("item", "Item name").required(true))
    .option(StringBuilder::new("codes", "Codes, separated by commas or new lines").required(true))
    .build()
}

pub async fn handle_addstock(ctx: &CommandContext, interaction: &Interaction, data: &CommandData) -> Reply {
    if !is_admin(interaction) {
        return Reply::text(replies::NOT_ADMIN);
    }
    let item = string_option(data, "item").unwrap_or_default();
    let codes = string_option(data, "codes").unwrap_or_default();

    match ctx.stock.add_stock(item, codes).await {
        Ok(added) => Reply::text(replies::stock_added(&normalize_item(item), &added)),
        Err(e) => Reply::text(replies::add_stock_failed(&e)),
    }
}
