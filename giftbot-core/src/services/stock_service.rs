// File: giftbot-core/src/services/stock_service.rs

use std::sync::Arc;

use giftbot_common::models::content::MessageContent;
use giftbot_common::models::inventory::normalize_item;
use giftbot_common::traits::InventoryRepository;

use crate::Error;
use crate::services::item_gates::ItemGates;
use crate::services::render::render_stock_summary;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockAdded {
    pub added: usize,
    pub total: usize,
}

/// Splits on commas and newlines (`\n` or `\r\n`), trims, drops blanks.
pub fn parse_codes(raw: &str) -> Vec<String> {
    raw.split([',', '\n'])
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

pub struct StockService {
    inventory: Arc<dyn InventoryRepository>,
    gates: Arc<ItemGates>,
}

impl StockService {
    pub fn new(inventory: Arc<dyn InventoryRepository>, gates: Arc<ItemGates>) -> Self {
        Self { inventory, gates }
    }

    pub async fn add_stock(&self, item: &str, raw_codes: &str) -> Result<StockAdded, Error> {
        self.add_codes(item, parse_codes(raw_codes)).await
    }

    pub async fn add_codes(&self, item: &str, codes: Vec<String>) -> Result<StockAdded, Error> {
        let item = normalize_item(item);
        if item.is_empty() {
            return Err(Error::Parse("item name is empty".into()));
        }
        if codes.is_empty() {
            return Err(Error::Parse("no codes found".into()));
        }

        let _gate = self.gates.lock(&item).await;
        let total = self.inventory.append(&item, &codes).await?;
        Ok(StockAdded {
            added: codes.len(),
            total,
        })
    }

    /// Same body the stockboards show.
    pub async fn summary(&self) -> MessageContent {
        render_stock_summary(&self.inventory.load().await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_codes_mixed_separators() {
        assert_eq!(parse_codes("a, b\n c,,\r\nd"), vec!["a", "b", "c", "d"]);
        assert!(parse_codes(" ,\n ").is_empty());
    }
}
