// File: giftbot-core/src/services/discord/mod.rs
//
// Routes gateway events to the slash and prefix command handlers.

pub mod replies;
pub mod prefix;
pub mod slashcommands;

use std::sync::Arc;

use tracing::error;
use twilight_cache_inmemory::InMemoryCache;
use twilight_http::Client as HttpClient;
use twilight_model::user::User;

use crate::platforms::discord::DiscordEvent;
use crate::services::{GiftService, StockService};
use crate::tasks::stockboard::StockboardManager;

/// Everything a command handler needs.
pub struct CommandContext {
    pub http: Arc<HttpClient>,
    pub cache: Arc<InMemoryCache>,
    pub gifts: Arc<GiftService>,
    pub stock: Arc<StockService>,
    pub boards: StockboardManager,
    pub board_interval: std::time::Duration,
    pub prefix: String,
    /// Extra role IDs allowed to run privileged prefix commands, on top of
    /// members with Administrator.
    pub admin_roles: Vec<String>,
    pub web: reqwest::Client,
}

pub async fn handle_event(ctx: &CommandContext, event: DiscordEvent) {
    let result = match event {
        DiscordEvent::Interaction(interaction) => {
            slashcommands::handle_interaction_create(ctx, &interaction).await
        }
        DiscordEvent::Message(msg) => prefix::handle_message(ctx, &msg).await,
    };
    if let Err(e) = result {
        error!("Command handling failed: {e}");
    }
}

/// `name` for migrated accounts, `name#1234` for legacy ones.
pub fn user_tag(user: &User) -> String {
    if user.discriminator == 0 {
        user.name.clone()
    } else {
        format!("{}#{:04}", user.name, user.discriminator)
    }
}
