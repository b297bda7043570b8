// File: giftbot-core/tests/stockboard_tests.rs

use std::sync::Arc;
use std::time::Duration;

use tempfile::{tempdir, TempDir};

use giftbot_common::models::board::{Board, BoardKey, BoardMap};
use giftbot_common::traits::{BoardRepository, InventoryRepository};
use giftbot_core::Error;
use giftbot_core::repositories::{JsonBoardRepository, JsonInventoryRepository};
use giftbot_core::services::render::{stock_line, STOCK_TITLE};
use giftbot_core::tasks::stockboard::{BoardState, StockboardManager, StockboardUpdater};
use giftbot_core::test_utils::helpers::FakeDiscord;

const TICK: Duration = Duration::from_millis(40);

struct Fixture {
    _dir: TempDir,
    inventory: Arc<JsonInventoryRepository>,
    boards: Arc<JsonBoardRepository>,
    discord: Arc<FakeDiscord>,
}

async fn fixture() -> Fixture {
    let dir = tempdir().unwrap();
    let inventory = Arc::new(JsonInventoryRepository::new(dir.path().join("gifts.txt")));
    let boards = Arc::new(JsonBoardRepository::new(dir.path().join("boards.json")));
    inventory
        .append("nitro", &["a".to_string(), "b".to_string()])
        .await
        .unwrap();
    let discord = Arc::new(FakeDiscord::new());
    discord.add_message("200", "300").await;
    Fixture {
        _dir: dir,
        inventory,
        boards,
        discord,
    }
}

impl Fixture {
    fn updater(&self, board: Board) -> StockboardUpdater {
        StockboardUpdater::new(
            board,
            self.inventory.clone(),
            self.boards.clone(),
            self.discord.clone(),
        )
    }

    fn manager(&self) -> StockboardManager {
        StockboardManager::new(
            self.inventory.clone(),
            self.boards.clone(),
            self.discord.clone(),
            TICK,
        )
    }

    async fn register(&self, board: &Board) {
        self.boards.upsert(&board.key(), board).await.unwrap();
    }
}

async fn wait_until<F, Fut>(mut cond: F)
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    for _ in 0..100 {
        if cond().await {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("condition not reached in time");
}

#[tokio::test]
async fn test_start_edits_existing_message() {
    let fx = fixture().await;
    let board = Board::new("100", "200", "300");
    fx.register(&board).await;

    let mut updater = fx.updater(board);
    assert_eq!(updater.start().await, BoardState::Running);

    let shown = fx.discord.message("200", "300").await.unwrap();
    assert_eq!(shown.title.as_deref(), Some(STOCK_TITLE));
    assert_eq!(shown.description, Some(stock_line("nitro", 2)));
    assert_eq!(fx.discord.edit_count(), 1);
}

#[tokio::test]
async fn test_tick_reflects_ledger_changes() -> Result<(), Error> {
    let fx = fixture().await;
    let board = Board::new("100", "200", "300");
    let mut updater = fx.updater(board);
    updater.start().await;

    fx.inventory.withdraw("nitro", 1).await?;
    assert_eq!(updater.tick().await, BoardState::Running);
    let shown = fx.discord.message("200", "300").await.unwrap();
    assert_eq!(shown.description, Some(stock_line("nitro", 1)));
    Ok(())
}

#[tokio::test]
async fn test_deleted_message_is_recreated() {
    let fx = fixture().await;
    let board = Board::new("100", "200", "300");
    fx.register(&board).await;
    let mut updater = fx.updater(board.clone());
    updater.start().await;

    fx.discord.delete_message("200", "300").await;
    assert_eq!(updater.tick().await, BoardState::Running);

    let new_id = updater.board().message_id.clone();
    assert_ne!(new_id, "300");
    assert_eq!(fx.discord.message_ids("200").await, vec![new_id.clone()]);

    let stored = fx.boards.get(&board.key()).await.unwrap();
    assert_eq!(stored.message_id, new_id);

    // Subsequent ticks edit the replacement.
    let edits = fx.discord.edit_count();
    updater.tick().await;
    assert_eq!(fx.discord.edit_count(), edits + 1);
}

#[tokio::test]
async fn test_missing_message_at_start_recovers() {
    let fx = fixture().await;
    let board = Board::new("100", "200", "999");
    fx.register(&board).await;

    let mut updater = fx.updater(board.clone());
    assert_eq!(updater.start().await, BoardState::Running);
    assert_ne!(fx.boards.get(&board.key()).await.unwrap().message_id, "999");
}

#[tokio::test]
async fn test_deleted_channel_removes_board() {
    let fx = fixture().await;
    let board = Board::new("100", "200", "300");
    fx.register(&board).await;
    let mut updater = fx.updater(board.clone());
    updater.start().await;

    fx.discord.delete_channel("200").await;
    assert_eq!(updater.tick().await, BoardState::Stopped);
    assert_eq!(fx.boards.get(&board.key()).await, None);

    // Terminal: further ticks do nothing.
    assert_eq!(updater.tick().await, BoardState::Stopped);
}

#[tokio::test]
async fn test_transient_failure_keeps_board() {
    let fx = fixture().await;
    let board = Board::new("100", "200", "300");
    fx.register(&board).await;
    let mut updater = fx.updater(board.clone());
    updater.start().await;

    fx.discord.set_transient_failure(true);
    assert_eq!(updater.tick().await, BoardState::Running);
    assert_eq!(updater.board().message_id, "300");
    assert_eq!(fx.boards.get(&board.key()).await, Some(board.clone()));

    fx.discord.set_transient_failure(false);
    let edits = fx.discord.edit_count();
    assert_eq!(updater.tick().await, BoardState::Running);
    assert_eq!(fx.discord.edit_count(), edits + 1);
    assert_eq!(fx.discord.message_ids("200").await, vec!["300".to_string()]);
}

#[tokio::test]
async fn test_manager_start_is_idempotent_and_stop_removes() {
    let fx = fixture().await;
    let board = Board::new("100", "200", "300");
    fx.register(&board).await;
    let manager = fx.manager();

    assert!(manager.start(board.clone()));
    assert!(!manager.start(board.clone()));
    assert_eq!(manager.running_keys(), vec![board.key()]);

    // Ticks keep editing the one message.
    let discord = fx.discord.clone();
    wait_until(|| {
        let discord = discord.clone();
        async move { discord.edit_count() >= 3 }
    })
    .await;
    assert_eq!(fx.discord.message_ids("200").await, vec!["300".to_string()]);

    assert!(manager.stop(&board.key()).await);
    assert!(!manager.is_running(&board.key()));
    assert!(!manager.stop(&board.key()).await);

    let edits = fx.discord.edit_count();
    tokio::time::sleep(TICK * 4).await;
    assert_eq!(fx.discord.edit_count(), edits);
    // Stopping an updater does not deregister the board.
    assert!(fx.boards.get(&board.key()).await.is_some());
}

#[tokio::test]
async fn test_manager_drops_board_when_channel_disappears() {
    let fx = fixture().await;
    let board = Board::new("100", "200", "300");
    fx.register(&board).await;
    let manager = fx.manager();
    manager.start(board.clone());

    fx.discord.delete_channel("200").await;

    let m = manager.clone();
    let key = board.key();
    wait_until(|| {
        let m = m.clone();
        let key = key.clone();
        async move { !m.is_running(&key) }
    })
    .await;
    assert_eq!(fx.boards.get(&board.key()).await, None);
}

#[tokio::test]
async fn test_create_board_replaces_existing() -> Result<(), Error> {
    let fx = fixture().await;
    let manager = fx.manager();

    let first = manager.create_board("100", "200").await?;
    let second = manager.create_board("100", "200").await?;
    assert_ne!(first.message_id, second.message_id);
    assert_eq!(manager.running_keys(), vec![BoardKey::from("100_200")]);

    let stored = fx.boards.get(&BoardKey::from("100_200")).await.unwrap();
    assert_eq!(stored, second);

    assert!(matches!(
        manager.create_board("100", "404").await,
        Err(Error::LocationUnreachable(_))
    ));
    manager.shutdown().await;
    assert!(manager.running_keys().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_resume_all_skips_invalid_entries() -> Result<(), Error> {
    let fx = fixture().await;
    fx.discord.add_message("201", "301").await;

    let mut map = BoardMap::new();
    map.insert(BoardKey::from("100_200"), Board::new("100", "200", "300"));
    map.insert(BoardKey::from("100_201"), Board::new("100", "201", "301"));
    map.insert(BoardKey::from("100_202"), Board::new("100", "202", ""));
    map.insert(BoardKey::from("wrong"), Board::new("100", "203", "303"));
    fx.boards.save(&map).await?;

    let manager = fx.manager();
    assert_eq!(manager.resume_all().await, 2);
    let mut keys = manager.running_keys();
    keys.sort();
    assert_eq!(keys, vec![BoardKey::from("100_200"), BoardKey::from("100_201")]);
    manager.shutdown().await;
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_create_board_keeps_registry_and_updater_aligned() -> Result<(), Error> {
    let fx = fixture().await;
    fx.discord.set_latency(Duration::from_millis(60));
    let manager = fx.manager();

    let a = {
        let m = manager.clone();
        tokio::spawn(async move { m.create_board("100", "200").await })
    };
    let b = {
        let m = manager.clone();
        tokio::spawn(async move { m.create_board("100", "200").await })
    };
    let first = a.await.unwrap()?;
    let second = b.await.unwrap()?;
    assert_ne!(first.message_id, second.message_id);

    let key = BoardKey::from("100_200");
    assert_eq!(manager.running_keys(), vec![key.clone()]);
    let current = fx.boards.get(&key).await.unwrap().message_id;
    let stale = if current == first.message_id { &second.message_id } else { &first.message_id };

    // The live updater must be editing the registered message, not the other one.
    fx.inventory.withdraw("nitro", 1).await?;
    let discord = fx.discord.clone();
    let watched = current.clone();
    wait_until(|| {
        let discord = discord.clone();
        let watched = watched.clone();
        async move {
            discord.message("200", &watched).await.and_then(|m| m.description)
                == Some(stock_line("nitro", 1))
        }
    })
    .await;
    let frozen = fx.discord.message("200", stale).await.unwrap();
    assert_eq!(frozen.description, Some(stock_line("nitro", 2)));

    manager.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn test_cancelled_board_does_not_post_recovery() {
    let fx = fixture().await;
    let board = Board::new("100", "200", "999");
    fx.register(&board).await;

    let (cancel_tx, cancel_rx) = tokio::sync::watch::channel(false);
    let mut updater = fx.updater(board.clone()).with_cancel(cancel_rx);
    cancel_tx.send(true).unwrap();

    assert_eq!(updater.start().await, BoardState::Stopped);
    assert!(fx.discord.sent().await.is_empty());
    assert_eq!(fx.discord.message_ids("200").await, vec!["300".to_string()]);
    // Cancellation belongs to the manager; the registry entry is left alone.
    assert_eq!(fx.boards.get(&board.key()).await, Some(board));
}
