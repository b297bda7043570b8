// File: giftbot-core/src/services/discord/slashcommands/mod.rs

pub mod addstock;
pub mod gift;
pub mod stockboard;
pub mod itemlist;

use std::sync::Arc;

use tracing::{debug, info};
use twilight_http::Client as HttpClient;
use twilight_model::application::command::Command;
use twilight_model::application::interaction::application_command::{CommandData, CommandOptionValue};
use twilight_model::application::interaction::{Interaction, InteractionData};
use twilight_model::channel::message::MessageFlags;
use twilight_model::guild::Permissions;
use twilight_model::http::interaction::{InteractionResponse, InteractionResponseData, InteractionResponseType};
use twilight_model::id::Id;
use twilight_model::id::marker::{ApplicationMarker, ChannelMarker, UserMarker};

use crate::Error;
use crate::platforms::discord::notifier::build_embed;
use crate::services::discord::CommandContext;
use crate::services::discord::replies::Reply;

pub fn global_commands() -> Vec<Command> {
    vec![
        addstock::create_addstock_command(),
        gift::create_gift_command(),
        stockboard::create_stockboard_command(),
        itemlist::create_itemlist_command(),
    ]
}

pub async fn register_global_slash_commands(
    http: &Arc<HttpClient>,
    application_id: Id<ApplicationMarker>,
) -> Result<(), Error> {
    let commands = global_commands();
    http.interaction(application_id)
        .set_global_commands(&commands)
        .await
        .map_err(|e| Error::Platform(format!("Failed to register global slash commands: {e}")))?;
    info!("Registered {} global slash command(s).", commands.len());
    Ok(())
}

/// Dispatch slash commands from an interaction.
///
/// Every command is deferred first: gifts wait on a DM round-trip and disk
/// writes, which can exceed Discord's three second reply window.
pub async fn handle_interaction_create(ctx: &CommandContext, interaction: &Interaction) -> Result<(), Error> {
    let Some(InteractionData::ApplicationCommand(data)) = &interaction.data else {
        return Ok(());
    };
    let name = data.name.as_str();
    debug!("Slash command /{name}");

    let ephemeral = matches!(name, "addstock" | "stockboard");
    defer(ctx, interaction, ephemeral).await?;

    let reply = match name {
        "addstock" => addstock::handle_addstock(ctx, interaction, data).await,
        "gift" => gift::handle_gift(ctx, interaction, data).await,
        "stockboard" => stockboard::handle_stockboard(ctx, interaction, data).await,
        "itemlist" => itemlist::handle_itemlist(ctx).await,
        other => Reply::text(format!("Unrecognized command: {other}")),
    };

    finish(ctx, interaction, &reply).await
}

async fn defer(ctx: &CommandContext, interaction: &Interaction, ephemeral: bool) -> Result<(), Error> {
    ctx.http
        .interaction(interaction.application_id)
        .create_response(
            interaction.id,
            &interaction.token,
            &InteractionResponse {
                kind: InteractionResponseType::DeferredChannelMessageWithSource,
                data: Some(InteractionResponseData {
                    flags: ephemeral.then_some(MessageFlags::EPHEMERAL),
                    ..Default::default()
                }),
            },
        )
        .await
        .map_err(|e| Error::Platform(format!("Error deferring interaction: {e}")))?;
    Ok(())
}

async fn finish(ctx: &CommandContext, interaction: &Interaction, reply: &Reply) -> Result<(), Error> {
    let embeds = match &reply.embed {
        Some(content) => vec![build_embed(content)?],
        None => Vec::new(),
    };
    ctx.http
        .interaction(interaction.application_id)
        .update_response(&interaction.token)
        .content(reply.text.as_deref())
        .embeds(Some(embeds.as_slice()))
        .await
        .map_err(|e| Error::Platform(format!("Error answering interaction: {e}")))?;
    Ok(())
}

/// Discord fills in the member's resolved permissions on guild interactions.
pub(crate) fn is_admin(interaction: &Interaction) -> bool {
    interaction
        .member
        .as_ref()
        .and_then(|m| m.permissions)
        .is_some_and(|p| p.contains(Permissions::ADMINISTRATOR))
}

pub(crate) fn string_option<'a>(data: &'a CommandData, name: &str) -> Option<&'a str> {
    data.options.iter().find(|o| o.name == name).and_then(|o| match &o.value {
        CommandOptionValue::String(s) => Some(s.as_str()),
        _ => None,
    })
}

pub(crate) fn integer_option(data: &CommandData, name: &str) -> Option<i64> {
    data.options.iter().find(|o| o.name == name).and_then(|o| match o.value {
        CommandOptionValue::Integer(i) => Some(i),
        _ => None,
    })
}

pub(crate) fn user_option(data: &CommandData, name: &str) -> Option<Id<UserMarker>> {
    data.options.iter().find(|o| o.name == name).and_then(|o| match o.value {
        CommandOptionValue::User(id) => Some(id),
        _ => None,
    })
}

pub(crate) fn channel_option(data: &CommandData, name: &str) -> Option<Id<ChannelMarker>> {
    data.options.iter().find(|o| o.name == name).and_then(|o| match o.value {
        CommandOptionValue::Channel(id) => Some(id),
        _ => None,
    })
}

pub(crate) fn caller_tag(interaction: &Interaction) -> String {
    interaction
        .author()
        .map(crate::services::discord::user_tag)
        .unwrap_or_else(|| "unknown".to_string())
}
