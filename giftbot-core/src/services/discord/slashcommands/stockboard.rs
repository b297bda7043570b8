// File: giftbot-core/src/services/discord/slashcommands/stockboard.rs

use tracing::error;
use twilight_model::application::command::{Command, CommandType};
use twilight_model::application::interaction::Interaction;
use twilight_model::application::interaction::application_command::CommandData;
use twilight_model::guild::Permissions;
use twilight_util::builder::command::{ChannelBuilder, CommandBuilder};

use crate::services::discord::CommandContext;
use crate::services::discord::replies::{self, Reply};
use crate::services::discord::slashcommands::{channel_option, is_admin};

pub fn create_stockboard_command() -> Command {
    CommandBuilder::new(
        "stockboard",
        "Post a stock message that refreshes itself",
        CommandType::ChatInput,
    )
    .default_member_permissions(Permissions::ADMINISTRATOR)
    .option(ChannelBuilder::new("channel", "Channel for the board (default: this one)"))
    .build()
}

pub async fn handle_stockboard(ctx: &CommandContext, interaction: &Interaction, data: &CommandData) -> Reply {
    if !is_admin(interaction) {
        return Reply::text(replies::NOT_ADMIN);
    }
    let Some(guild_id) = interaction.guild_id else {
        return Reply::text(replies::GUILD_ONLY);
    };
    let Some(channel_id) = channel_option(data, "channel").or(interaction.channel.as_ref().map(|c| c.id)) else {
        return Reply::text(replies::GUILD_ONLY);
    };

    match ctx
        .boards
        .create_board(&guild_id.to_string(), &channel_id.to_string())
        .await
    {
        Ok(_) => Reply::text(replies::board_created(ctx.board_interval)),
        Err(e) => {
            error!("Could not create stockboard in {channel_id}: {e}");
            Reply::text(format!("❌ Could not create the stockboard: {e}"))
        }
    }
}
