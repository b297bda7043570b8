use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, trace, warn};

use twilight_gateway::{
    self as gateway,
    CloseFrame,
    Config,
    Event,
    EventTypeFlags,
    Intents,
    MessageSender,
    Shard,
    StreamExt,
};
use twilight_cache_inmemory::{InMemoryCache, ResourceType};
use twilight_http::Client as HttpClient;
use twilight_http::client::ClientBuilder;
use twilight_model::application::interaction::Interaction;
use twilight_model::channel::Message;

use crate::Error;
use crate::platforms::{ConnectionStatus, PlatformIntegration};

/// Inbound events the command layer cares about.
#[derive(Debug, Clone)]
pub enum DiscordEvent {
    Interaction(Box<Interaction>),
    Message(Box<Message>),
}

/// Reads one shard's gateway stream, keeps the cache current and forwards
/// interactions and non-bot messages to `tx`.
async fn shard_runner(mut shard: Shard, tx: UnboundedSender<DiscordEvent>, cache: Arc<InMemoryCache>) {
    let shard_id = shard.id().number();
    info!("(ShardRunner) Shard {shard_id} started. Listening for events.");

    while let Some(item) = shard.next_event(EventTypeFlags::all()).await {
        let event = match item {
            Ok(event) => {
                cache.update(&event);
                event
            }
            Err(err) => {
                error!("Shard {shard_id} => error receiving event: {err:?}");
                continue;
            }
        };

        let forwarded = match event {
            Event::Ready(ready) => {
                info!("Shard {shard_id} => READY as {} (ID={})", ready.user.name, ready.user.id);
                continue;
            }
            Event::InteractionCreate(interaction) => DiscordEvent::Interaction(Box::new(interaction.0)),
            Event::MessageCreate(msg) => {
                if msg.author.bot {
                    debug!("Ignoring bot message from {}", msg.author.name);
                    continue;
                }
                DiscordEvent::Message(Box::new(msg.0))
            }
            other => {
                trace!("Shard {shard_id} => unhandled event: {:?}", other.kind());
                continue;
            }
        };

        if tx.send(forwarded).is_err() {
            warn!("Shard {shard_id} => event receiver dropped; stopping runner.");
            break;
        }
    }

    warn!("(ShardRunner) Shard {shard_id} event loop ended.");
}

/// Gateway shards plus the shared HTTP client.
///
/// The HTTP client exists from construction so the notifier and command
/// layer can share it before `connect` is called.
pub struct DiscordPlatform {
    pub token: String,
    pub connection_status: ConnectionStatus,

    rx: Mutex<Option<UnboundedReceiver<DiscordEvent>>>,

    shard_tasks: Vec<JoinHandle<()>>,
    shard_senders: Vec<MessageSender>,

    pub http: Arc<HttpClient>,
    /// Guilds, channels, roles and members seen on the gateway; enough to
    /// compute a member's permissions in a channel.
    pub cache: Arc<InMemoryCache>,
}

impl DiscordPlatform {
    pub fn new(token: String) -> Self {
        let http = Arc::new(
            ClientBuilder::new()
                .token(token.clone())
                .timeout(Duration::from_secs(30))
                .build(),
        );
        Self {
            token,
            connection_status: ConnectionStatus::Disconnected,
            rx: Mutex::new(None),
            shard_tasks: Vec::new(),
            shard_senders: Vec::new(),
            http,
            cache: Arc::new(
                InMemoryCache::builder()
                    .resource_types(
                        ResourceType::GUILD
                            | ResourceType::CHANNEL
                            | ResourceType::ROLE
                            | ResourceType::MEMBER,
                    )
                    .build(),
            ),
        }
    }

    /// Next inbound event, or `None` once every shard has stopped.
    pub async fn next_event(&self) -> Option<DiscordEvent> {
        let mut guard = self.rx.lock().await;
        match guard.as_mut() {
            Some(r) => r.recv().await,
            None => None,
        }
    }
}

#[async_trait]
impl PlatformIntegration for DiscordPlatform {
    async fn connect(&mut self) -> Result<(), Error> {
        if matches!(self.connection_status, ConnectionStatus::Connected) {
            info!("(DiscordPlatform) Already connected => skipping");
            return Ok(());
        }
        if self.token.is_empty() {
            return Err(Error::Platform("Discord token is empty".into()));
        }

        let (tx, rx) = unbounded_channel::<DiscordEvent>();
        {
            let mut guard = self.rx.lock().await;
            *guard = Some(rx);
        }

        let config = Config::new(
            self.token.clone(),
            Intents::GUILDS
                | Intents::GUILD_MESSAGES
                | Intents::MESSAGE_CONTENT
                | Intents::DIRECT_MESSAGES,
        );

        let shards = gateway::create_recommended(&self.http, config, |_, b| b.build())
            .await
            .map_err(|e| Error::Platform(format!("create_recommended error: {e}")))?;

        for shard in shards {
            self.shard_senders.push(shard.sender());
            let handle = tokio::spawn(shard_runner(shard, tx.clone(), self.cache.clone()));
            self.shard_tasks.push(handle);
        }

        self.connection_status = ConnectionStatus::Connected;
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<(), Error> {
        self.connection_status = ConnectionStatus::Disconnected;

        for sender in &self.shard_senders {
            let _ = sender.close(CloseFrame::NORMAL);
        }
        for task in self.shard_tasks.drain(..) {
            if tokio::time::timeout(Duration::from_secs(5), task).await.is_err() {
                warn!("(DiscordPlatform) Shard task did not exit after close; abandoning it.");
            }
        }
        self.shard_senders.clear();

        let mut guard = self.rx.lock().await;
        *guard = None;

        Ok(())
    }

    async fn get_connection_status(&self) -> Result<ConnectionStatus, Error> {
        Ok(self.connection_status.clone())
    }
}
