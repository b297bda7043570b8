// File: giftbot-core/src/tasks/stockboard.rs
//
// Live stock boards. Each registered board gets one background task that
// re-renders the ledger every interval and edits its message in place. When
// the message disappears the board posts a fresh one and records the new ID;
// when the channel disappears the board deregisters itself.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use giftbot_common::models::board::{Board, BoardKey};
use giftbot_common::models::content::Recipient;
use giftbot_common::traits::{BoardRepository, InventoryRepository, MessageBoard};

use crate::Error;
use crate::services::item_gates::ItemGates;
use crate::services::render::render_stock_summary;

pub const DEFAULT_BOARD_INTERVAL: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoardState {
    Starting,
    Recovering,
    Running,
    /// Terminal. The board has been removed from the registry.
    Stopped,
}

/// State machine for a single board. The manager's timer loop drives it;
/// it has no timer of its own.
pub struct StockboardUpdater {
    key: BoardKey,
    board: Board,
    state: BoardState,
    inventory: Arc<dyn InventoryRepository>,
    boards: Arc<dyn BoardRepository>,
    surface: Arc<dyn MessageBoard>,
    cancel: Option<watch::Receiver<bool>>,
}

impl StockboardUpdater {
    pub fn new(
        board: Board,
        inventory: Arc<dyn InventoryRepository>,
        boards: Arc<dyn BoardRepository>,
        surface: Arc<dyn MessageBoard>,
    ) -> Self {
        Self {
            key: board.key(),
            board,
            state: BoardState::Starting,
            inventory,
            boards,
            surface,
            cancel: None,
        }
    }

    /// Once the flag flips, the updater stops writing to the registry.
    pub fn with_cancel(mut self, cancel: watch::Receiver<bool>) -> Self {
        self.cancel = Some(cancel);
        self
    }

    pub fn key(&self) -> &BoardKey {
        &self.key
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn state(&self) -> BoardState {
        self.state
    }

    /// Resolve channel and message, then either render once or recover.
    pub async fn start(&mut self) -> BoardState {
        self.state = BoardState::Starting;

        match self.surface.resolve_channel(&self.board.channel_id).await {
            Ok(()) => {}
            Err(Error::LocationUnreachable(_)) => {
                warn!(
                    "Board {}: channel {} not found at start.",
                    self.key, self.board.channel_id
                );
                return self.stop().await;
            }
            Err(e) => {
                warn!("Board {}: could not resolve channel yet ({e}); will retry on tick.", self.key);
                self.state = BoardState::Running;
                return self.state;
            }
        }

        match self
            .surface
            .fetch_message(&self.board.channel_id, &self.board.message_id)
            .await
        {
            Ok(()) => {
                self.state = BoardState::Running;
                self.tick().await
            }
            Err(Error::ReferenceStale(_)) => {
                info!(
                    "Board {}: message {} is gone; creating a new one.",
                    self.key, self.board.message_id
                );
                self.recover().await
            }
            Err(Error::LocationUnreachable(_)) => self.stop().await,
            Err(e) => {
                warn!("Board {}: could not fetch message yet ({e}); will retry on tick.", self.key);
                self.state = BoardState::Running;
                self.state
            }
        }
    }

    /// One refresh: reload the ledger, render, edit in place, heal on drift.
    pub async fn tick(&mut self) -> BoardState {
        match self.state {
            BoardState::Stopped => return self.state,
            // A previous recovery could not post; try again.
            BoardState::Recovering => return self.recover().await,
            BoardState::Starting | BoardState::Running => {}
        }

        let content = render_stock_summary(&self.inventory.load().await);
        match self
            .surface
            .edit_message(&self.board.channel_id, &self.board.message_id, &content)
            .await
        {
            Ok(()) => {
                self.state = BoardState::Running;
                self.state
            }
            Err(e) => self.handle_edit_failure(e).await,
        }
    }

    async fn handle_edit_failure(&mut self, err: Error) -> BoardState {
        let cause = if err.is_platform_drift() {
            err
        } else {
            warn!("Board {}: update failed ({err}); checking channel and message.", self.key);
            match self.classify_failure().await {
                Some(drift) => drift,
                None => {
                    // Transient. Keep the timer and message as they are.
                    self.state = BoardState::Running;
                    return self.state;
                }
            }
        };

        match cause {
            Error::LocationUnreachable(_) => {
                warn!(
                    "Board {}: channel {} is no longer available; stopping.",
                    self.key, self.board.channel_id
                );
                self.stop().await
            }
            _ => {
                warn!("Board {}: message {} is missing; recreating.", self.key, self.board.message_id);
                self.recover().await
            }
        }
    }

    /// Classifies an unexplained edit failure. `None` means "nothing is gone".
    async fn classify_failure(&self) -> Option<Error> {
        match self.surface.resolve_channel(&self.board.channel_id).await {
            Err(e @ Error::LocationUnreachable(_)) => return Some(e),
            Err(e) => {
                debug!("Board {}: channel check inconclusive: {e}", self.key);
                return None;
            }
            Ok(()) => {}
        }
        match self
            .surface
            .fetch_message(&self.board.channel_id, &self.board.message_id)
            .await
        {
            Err(e) if e.is_platform_drift() => Some(e),
            _ => None,
        }
    }

    /// Post a fresh summary and make it the board's current message.
    async fn recover(&mut self) -> BoardState {
        self.state = BoardState::Recovering;
        if self.is_cancelled() {
            debug!("Board {}: cancelled before recovery; not posting.", self.key);
            self.state = BoardState::Stopped;
            return self.state;
        }

        let content = render_stock_summary(&self.inventory.load().await);
        let recipient = Recipient::Channel(self.board.channel_id.clone());
        let sent = match self.surface.deliver(&recipient, &content).await {
            Ok(sent) => sent,
            Err(Error::LocationUnreachable(_)) => return self.stop().await,
            Err(e) => {
                error!("Board {}: recovery attempt failed: {e}", self.key);
                return self.state;
            }
        };

        let old = std::mem::replace(&mut self.board.message_id, sent.message_id);
        if self.is_cancelled() {
            debug!("Board {}: cancelled during recovery; not recording new message.", self.key);
            self.state = BoardState::Stopped;
            return self.state;
        }
        if let Err(e) = self.boards.upsert(&self.key, &self.board).await {
            error!("Board {}: could not save new message ID: {e}", self.key);
        }
        info!(
            "Board {}: replaced message {} with {}.",
            self.key, old, self.board.message_id
        );

        self.state = BoardState::Running;
        self.state
    }

    async fn stop(&mut self) -> BoardState {
        self.state = BoardState::Stopped;
        if self.is_cancelled() {
            return self.state;
        }

        // Leave the entry alone if a newer board already took over this key.
        match self.boards.get(&self.key).await {
            Some(current) if current.message_id != self.board.message_id => {
                debug!("Board {}: registry already points at {}; not removing.", self.key, current.message_id);
            }
            Some(_) => match self.boards.remove(&self.key).await {
                Ok(_) => info!("Board {} removed from registry.", self.key),
                Err(e) => error!("Board {}: failed to remove from registry: {e}", self.key),
            },
            None => {}
        }
        self.state
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().map(|rx| *rx.borrow()).unwrap_or(false)
    }
}

struct RunningBoard {
    generation: u64,
    cancel: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

struct ManagerInner {
    inventory: Arc<dyn InventoryRepository>,
    boards: Arc<dyn BoardRepository>,
    surface: Arc<dyn MessageBoard>,
    interval: Duration,
    running: DashMap<BoardKey, RunningBoard>,
    next_generation: AtomicU64,
    /// Serializes create/replace per board key.
    replace_gates: ItemGates,
}

/// Table of live board tasks. At most one task per board key.
#[derive(Clone)]
pub struct StockboardManager {
    inner: Arc<ManagerInner>,
}

impl StockboardManager {
    pub fn new(
        inventory: Arc<dyn InventoryRepository>,
        boards: Arc<dyn BoardRepository>,
        surface: Arc<dyn MessageBoard>,
        interval: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(ManagerInner {
                inventory,
                boards,
                surface,
                interval,
                running: DashMap::new(),
                next_generation: AtomicU64::new(0),
                replace_gates: ItemGates::new(),
            }),
        }
    }

    pub fn is_running(&self, key: &BoardKey) -> bool {
        self.inner.running.contains_key(key)
    }

    pub fn running_keys(&self) -> Vec<BoardKey> {
        self.inner.running.iter().map(|r| r.key().clone()).collect()
    }

    /// Spawns the updater for `board`. Returns false if one is already running.
    pub fn start(&self, board: Board) -> bool {
        let key = board.key();
        match self.inner.running.entry(key.clone()) {
            Entry::Occupied(_) => {
                debug!("Updater already running for {key}");
                false
            }
            Entry::Vacant(slot) => {
                let generation = self.inner.next_generation.fetch_add(1, Ordering::Relaxed);
                let (cancel_tx, cancel_rx) = watch::channel(false);
                let handle = tokio::spawn(run_board(
                    self.inner.clone(),
                    board,
                    generation,
                    cancel_rx,
                ));
                slot.insert(RunningBoard {
                    generation,
                    cancel: cancel_tx,
                    handle,
                });
                info!("Started stockboard updater for {key}");
                true
            }
        }
    }

    /// Removes the key from the table and cancels its task. When this returns
    /// the task has exited and will not tick again.
    pub async fn stop(&self, key: &BoardKey) -> bool {
        let Some((_, running)) = self.inner.running.remove(key) else {
            return false;
        };
        let _ = running.cancel.send(true);
        if let Err(e) = running.handle.await {
            warn!("Board {key}: updater task ended abnormally: {e}");
        }
        info!("Stopped board updater for {key}");
        true
    }

    /// Starts an updater for every valid entry in the registry.
    pub async fn resume_all(&self) -> usize {
        let boards = self.inner.boards.load().await;
        if boards.is_empty() {
            info!("No boards to start.");
            return 0;
        }

        let mut started = 0;
        for (key, board) in boards {
            if !board.is_valid() || board.key() != key {
                warn!("Invalid board entry for key {key}, skipping.");
                continue;
            }
            if self.start(board) {
                started += 1;
            }
        }
        started
    }

    /// Posts a new summary in `channel_id`, registers it and starts its updater.
    /// An existing board in the same channel is replaced. Concurrent calls for
    /// one channel run one after another, so the registry and the live
    /// updater always point at the same message.
    pub async fn create_board(&self, guild_id: &str, channel_id: &str) -> Result<Board, Error> {
        let key = BoardKey::from_location(guild_id, channel_id);
        let _gate = self.inner.replace_gates.lock(key.as_str()).await;

        let content = render_stock_summary(&self.inner.inventory.load().await);
        let sent = self
            .inner
            .surface
            .deliver(&Recipient::Channel(channel_id.to_string()), &content)
            .await?;
        let board = Board::new(guild_id, channel_id, sent.message_id);

        if self.stop(&key).await {
            info!("Replacing existing board {key}");
        }
        self.inner.boards.upsert(&key, &board).await?;

        // Something outside this gate (a resume) may have claimed the key in
        // between; take it over.
        for _ in 0..3 {
            if self.start(board.clone()) {
                return Ok(board);
            }
            self.stop(&key).await;
        }
        error!("Board {key}: could not start updater for message {}", board.message_id);
        Err(Error::Platform(format!("could not start updater for board {key}")))
    }

    /// Cancels every board and waits for in-flight ticks to finish.
    pub async fn shutdown(&self) {
        let keys = self.running_keys();
        info!("Shutting down {} stockboard updater(s)...", keys.len());
        for key in keys {
            self.stop(&key).await;
        }
    }
}

async fn run_board(
    inner: Arc<ManagerInner>,
    board: Board,
    generation: u64,
    mut cancel_rx: watch::Receiver<bool>,
) {
    let key = board.key();
    let mut updater = StockboardUpdater::new(
        board,
        inner.inventory.clone(),
        inner.boards.clone(),
        inner.surface.clone(),
    )
    .with_cancel(cancel_rx.clone());

    let mut state = updater.start().await;

    let mut ticker = interval_at(Instant::now() + inner.interval, inner.interval);
    // A slow tick delays the next one instead of stacking edits.
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    while state != BoardState::Stopped {
        tokio::select! {
            biased;
            changed = cancel_rx.changed() => {
                if changed.is_err() || *cancel_rx.borrow() {
                    debug!("Board {key}: cancelled.");
                    return;
                }
            }
            _ = ticker.tick() => {
                state = updater.tick().await;
            }
        }
    }

    // Stopped on its own (channel gone). Only drop our own table entry.
    inner
        .running
        .remove_if(&key, |_, running| running.generation == generation);
    info!("Board {key}: updater exited.");
}
