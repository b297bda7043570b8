// giftbot-core/src/repositories/json/boards.rs
//
// Board registry: `{ "<guildId>_<channelId>": { guildId, channelId, messageId } }`.

use std::path::PathBuf;

use async_trait::async_trait;
use tracing::debug;

use giftbot_common::models::board::{Board, BoardKey, BoardMap};
use giftbot_common::traits::repository_traits::BoardRepository;

use crate::Error;
use crate::repositories::json::document::JsonDocument;

pub struct JsonBoardRepository {
    doc: JsonDocument<BoardMap>,
}

impl JsonBoardRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            doc: JsonDocument::new(path),
        }
    }
}

#[async_trait]
impl BoardRepository for JsonBoardRepository {
    async fn load(&self) -> BoardMap {
        self.doc.load().await
    }

    async fn save(&self, boards: &BoardMap) -> Result<(), Error> {
        self.doc.save(boards).await
    }

    async fn get(&self, key: &BoardKey) -> Option<Board> {
        self.doc.load().await.remove(key)
    }

    async fn upsert(&self, key: &BoardKey, board: &Board) -> Result<(), Error> {
        self.doc
            .update(|boards| {
                boards.insert(key.clone(), board.clone());
                Ok(())
            })
            .await?;
        debug!("Board {} -> message {}", key, board.message_id);
        Ok(())
    }

    async fn remove(&self, key: &BoardKey) -> Result<Option<Board>, Error> {
        self.doc.update(|boards| Ok(boards.remove(key))).await
    }
}
