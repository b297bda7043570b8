// File: giftbot-core/src/services/discord/slashcommands/itemlist.rs

use twilight_model::application::command::{Command, CommandType};
use twilight_util::builder::command::CommandBuilder;

use crate::services::discord::CommandContext;
use crate::services::discord::replies::Reply;

pub fn create_itemlist_command() -> Command {
    CommandBuilder::new("itemlist", "Show remaining stock per item", CommandType::ChatInput).build()
}

pub async fn handle_itemlist(ctx: &CommandContext) -> Reply {
    Reply::embed(ctx.stock.summary().await)
}
