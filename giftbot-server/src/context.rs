//! giftbot-server/src/context.rs
//!
//! Builds the service graph shared by the event loop and the command handlers.

use std::sync::Arc;
use std::time::Duration;

use twilight_model::id::Id;
use twilight_model::id::marker::ApplicationMarker;
use tracing::{info, warn};

use giftbot_core::Error;
use giftbot_core::platforms::discord::{DiscordNotifier, DiscordPlatform};
use giftbot_core::repositories::{JsonBoardRepository, JsonInventoryRepository};
use giftbot_core::services::discord::CommandContext;
use giftbot_core::services::{GiftService, ItemGates, StockService};
use giftbot_core::tasks::stockboard::StockboardManager;

use crate::Args;

pub struct ServerContext {
    pub platform: DiscordPlatform,
    pub commands: Arc<CommandContext>,
    pub application_id: Option<Id<ApplicationMarker>>,
}

impl ServerContext {
    pub fn new(args: &Args) -> Result<Self, Error> {
        let token = read_token()?;
        let application_id = read_application_id();

        let platform = DiscordPlatform::new(token);
        let notifier = Arc::new(DiscordNotifier::new(platform.http.clone()));

        let inventory = Arc::new(JsonInventoryRepository::new(&args.gifts_file));
        let boards = Arc::new(JsonBoardRepository::new(&args.boards_file));
        let gates = Arc::new(ItemGates::new());

        let gifts = Arc::new(GiftService::new(inventory.clone(), notifier.clone(), gates.clone()));
        let stock = Arc::new(StockService::new(inventory.clone(), gates));

        let board_interval = Duration::from_secs(args.board_interval_secs.max(1));
        let board_manager = StockboardManager::new(inventory, boards, notifier, board_interval);

        if !args.admin_roles.is_empty() {
            info!("Prefix commands also allowed for role(s): {}", args.admin_roles.join(", "));
        }

        let commands = Arc::new(CommandContext {
            http: platform.http.clone(),
            cache: platform.cache.clone(),
            gifts,
            stock,
            boards: board_manager,
            board_interval,
            prefix: args.prefix.clone(),
            admin_roles: args.admin_roles.clone(),
            web: reqwest::Client::new(),
        });

        info!("Service graph ready.");
        Ok(Self {
            platform,
            commands,
            application_id,
        })
    }
}

fn read_token() -> Result<String, Error> {
    std::env::var("TOKEN")
        .or_else(|_| std::env::var("DISCORD_TOKEN"))
        .ok()
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| Error::Platform("TOKEN (or DISCORD_TOKEN) is not set".into()))
}

fn read_application_id() -> Option<Id<ApplicationMarker>> {
    let raw = std::env::var("CLIENT_ID").ok()?;
    match raw.trim().parse::<u64>().ok().and_then(Id::new_checked) {
        Some(id) => Some(id),
        None => {
            warn!("CLIENT_ID '{raw}' is not a valid application ID; ignoring.");
            None
        }
    }
}
