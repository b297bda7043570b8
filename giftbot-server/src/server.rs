use tracing::{error, info, warn};

use giftbot_core::Error;
use giftbot_core::platforms::PlatformIntegration;
use giftbot_core::services::discord::{handle_event, slashcommands};
use giftbot_core::tasks::inflight::InFlight;

use crate::Args;
use crate::context::ServerContext;

pub async fn run_server(args: Args) -> Result<(), Error> {
    let mut ctx = ServerContext::new(&args)?;

    if args.register_commands {
        match ctx.application_id {
            Some(app_id) => {
                if let Err(e) = slashcommands::register_global_slash_commands(&ctx.platform.http, app_id).await {
                    error!("Slash command registration failed: {e}");
                }
            }
            None => warn!("--register-commands given but CLIENT_ID is missing; skipping."),
        }
    }

    ctx.platform.connect().await?;
    info!("Connected to Discord.");

    let resumed = ctx.commands.boards.resume_all().await;
    info!("Resumed {resumed} stockboard(s).");

    let mut inflight = InFlight::new();
    loop {
        tokio::select! {
            event = ctx.platform.next_event() => {
                match event {
                    Some(event) => {
                        // A gift waits on a DM round-trip; keep the gateway flowing meanwhile.
                        let commands = ctx.commands.clone();
                        inflight.spawn(async move { handle_event(&commands, event).await });
                    }
                    None => {
                        warn!("Gateway event stream closed; exiting.");
                        break;
                    }
                }
            }
            _ = inflight.reap(), if !inflight.is_empty() => {}
            res = tokio::signal::ctrl_c() => {
                if let Err(e) = res {
                    error!("Failed to listen for Ctrl-C: {e}");
                }
                info!("Ctrl-C detected; shutting down...");
                break;
            }
        }
    }

    // Handlers first: a gift may sit between withdraw and deliver/restore.
    let drained = inflight.drain().await;
    info!("{drained} in-flight command(s) finished.");
    // Then boards, so no tick races the gateway teardown.
    ctx.commands.boards.shutdown().await;
    if let Err(e) = ctx.platform.disconnect().await {
        error!("Error disconnecting from Discord: {e}");
    }
    info!("Server shutdown complete.");
    Ok(())
}
