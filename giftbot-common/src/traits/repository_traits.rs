use async_trait::async_trait;

use crate::error::Error;
use crate::models::board::{Board, BoardKey, BoardMap};
use crate::models::inventory::Inventory;

/// The stock ledger.
///
/// `load` never fails: a missing or unreadable ledger reads as empty stock.
/// Every mutating call is one atomic read-modify-write of the whole ledger.
#[async_trait]
pub trait InventoryRepository: Send + Sync {
    async fn load(&self) -> Inventory;

    /// Appends codes to the back of the item's queue; returns the new total.
    async fn append(&self, item: &str, codes: &[String]) -> Result<usize, Error>;

    /// Removes and returns the first `qty` codes, or fails with
    /// `UnknownItem`/`OutOfStock` leaving the queue untouched.
    async fn withdraw(&self, item: &str, qty: usize) -> Result<Vec<String>, Error>;

    /// Reinserts codes at the front of the queue; returns the new total.
    async fn restore(&self, item: &str, codes: &[String]) -> Result<usize, Error>;
}

/// Board key -> board. Same whole-document discipline as the ledger.
#[async_trait]
pub trait BoardRepository: Send + Sync {
    async fn load(&self) -> BoardMap;
    async fn save(&self, boards: &BoardMap) -> Result<(), Error>;
    async fn get(&self, key: &BoardKey) -> Option<Board>;
    async fn upsert(&self, key: &BoardKey, board: &Board) -> Result<(), Error>;
    async fn remove(&self, key: &BoardKey) -> Result<Option<Board>, Error>;
}
