pub mod runtime;
pub mod notifier;

pub use runtime::{DiscordEvent, DiscordPlatform};
pub use notifier::DiscordNotifier;
