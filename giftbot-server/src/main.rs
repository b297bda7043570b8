use std::path::PathBuf;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

mod context;
mod server;

#[derive(Parser, Debug, Clone)]
#[command(name = "giftbot")]
#[command(author, version, about = "GiftBot - hands out redemption codes by DM and keeps live stock boards")]
pub struct Args {
    /// Stock ledger (JSON object of item -> codes).
    #[arg(long, default_value = "./gifts.txt")]
    pub gifts_file: PathBuf,

    /// Board registry.
    #[arg(long, default_value = "./boards.json")]
    pub boards_file: PathBuf,

    /// Seconds between stockboard refreshes.
    #[arg(long, default_value_t = 10)]
    pub board_interval_secs: u64,

    /// Prefix for text commands.
    #[arg(long, default_value = "!")]
    pub prefix: String,

    /// Role ID allowed to run !gift and !addstock besides Administrators. Repeatable.
    #[arg(long = "admin-role")]
    pub admin_roles: Vec<String>,

    /// Publish the slash commands globally before connecting (needs CLIENT_ID).
    #[arg(long, default_value = "false")]
    pub register_commands: bool,
}

fn init_tracing() {
    let filter = EnvFilter::from_default_env()
        .add_directive("giftbot_core=info".parse().unwrap_or_default())
        .add_directive("giftbot_server=info".parse().unwrap_or_default());
    let sub = fmt().with_env_filter(filter).finish();
    if let Err(e) = tracing::subscriber::set_global_default(sub) {
        eprintln!("Failed to set global subscriber: {e}");
    }
}

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    init_tracing();
    let args = Args::parse();
    info!(
        "GiftBot starting. gifts={}, boards={}, interval={}s",
        args.gifts_file.display(),
        args.boards_file.display(),
        args.board_interval_secs
    );

    if let Err(e) = server::run_server(args).await {
        error!("Server error: {e}");
        std::process::exit(1);
    }
}
