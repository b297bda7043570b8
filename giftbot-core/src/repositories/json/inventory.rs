// giftbot-core/src/repositories/json/inventory.rs
//
// The stock ledger, stored as `{ "<item>": ["code", ...], ... }` in one file
// (gifts.txt by default, kept for compatibility with existing deployments).

use std::path::PathBuf;

use async_trait::async_trait;
use tracing::{debug, info};

use giftbot_common::models::inventory::Inventory;
use giftbot_common::traits::repository_traits::InventoryRepository;

use crate::Error;
use crate::repositories::json::document::JsonDocument;

pub struct JsonInventoryRepository {
    doc: JsonDocument<Inventory>,
}

impl JsonInventoryRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            doc: JsonDocument::new(path),
        }
    }

    /// Replaces the whole ledger. Used by tooling and tests.
    pub async fn save(&self, inventory: &Inventory) -> Result<(), Error> {
        self.doc.save(inventory).await
    }
}

#[async_trait]
impl InventoryRepository for JsonInventoryRepository {
    async fn load(&self) -> Inventory {
        self.doc.load().await
    }

    async fn append(&self, item: &str, codes: &[String]) -> Result<usize, Error> {
        let total = self.doc.update(|inv| Ok(inv.append(item, codes))).await?;
        info!("Added {} code(s) to '{}' (total {}).", codes.len(), item, total);
        Ok(total)
    }

    async fn withdraw(&self, item: &str, qty: usize) -> Result<Vec<String>, Error> {
        let codes = self.doc.update(|inv| inv.withdraw(item, qty)).await?;
        debug!("Withdrew {} code(s) from '{}'.", codes.len(), item);
        Ok(codes)
    }

    async fn restore(&self, item: &str, codes: &[String]) -> Result<usize, Error> {
        let total = self.doc.update(|inv| Ok(inv.restore(item, codes))).await?;
        info!("Restored {} code(s) to the front of '{}' (total {}).", codes.len(), item, total);
        Ok(total)
    }
}
