// File: giftbot-core/src/services/gift_service.rs
//
// Gift distribution: take codes from the ledger, DM them, and put them back
// if the DM cannot be delivered. Codes end up either with the recipient or
// back in the ledger.

use std::sync::Arc;

use tracing::{error, info, warn};

use giftbot_common::models::content::Recipient;
use giftbot_common::models::inventory::normalize_item;
use giftbot_common::traits::{InventoryRepository, Notifier};

use crate::Error;
use crate::services::item_gates::ItemGates;
use crate::services::render::render_gift;

#[derive(Debug, Clone)]
pub struct GiftRequest {
    pub item: String,
    /// `None` means one code.
    pub quantity: Option<i64>,
    /// Platform user ID of the recipient.
    pub recipient_id: String,
    /// Display tag of whoever issued the gift, shown to the recipient.
    pub sender: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Distribution {
    pub item: String,
    pub codes: Vec<String>,
}

impl Distribution {
    pub fn count(&self) -> usize {
        self.codes.len()
    }
}

pub fn resolve_quantity(quantity: Option<i64>) -> Result<usize, Error> {
    match quantity {
        None => Ok(1),
        Some(q) if q >= 1 => usize::try_from(q).map_err(|_| Error::InvalidQuantity(q)),
        Some(q) => Err(Error::InvalidQuantity(q)),
    }
}

pub struct GiftService {
    inventory: Arc<dyn InventoryRepository>,
    notifier: Arc<dyn Notifier>,
    gates: Arc<ItemGates>,
}

impl GiftService {
    pub fn new(
        inventory: Arc<dyn InventoryRepository>,
        notifier: Arc<dyn Notifier>,
        gates: Arc<ItemGates>,
    ) -> Self {
        Self {
            inventory,
            notifier,
            gates,
        }
    }

    /// Withdraw, deliver, and restore on failure, as one operation.
    ///
    /// The item stays locked for the whole sequence; nobody else sees the
    /// ledger between withdrawal and delivery/restore.
    pub async fn distribute(&self, request: &GiftRequest) -> Result<Distribution, Error> {
        let item = normalize_item(&request.item);
        let qty = resolve_quantity(request.quantity)?;

        let _gate = self.gates.lock(&item).await;

        let codes = self.inventory.withdraw(&item, qty).await?;

        let content = render_gift(&item, &codes, &request.sender);
        let recipient = Recipient::User(request.recipient_id.clone());

        match self.notifier.deliver(&recipient, &content).await {
            Ok(_) => {
                info!(
                    "Gift '{}' ({} code(s)) delivered to {} by {}",
                    item,
                    codes.len(),
                    request.recipient_id,
                    request.sender
                );
                Ok(Distribution { item, codes })
            }
            Err(delivery_err) => {
                warn!(
                    "Gift '{}' to {} failed: {}; restoring {} code(s).",
                    item,
                    request.recipient_id,
                    delivery_err,
                    codes.len()
                );
                match self.inventory.restore(&item, &codes).await {
                    Ok(_) => Err(Error::GiftNotDelivered {
                        item,
                        restored: codes.len(),
                        cause: Box::new(delivery_err),
                    }),
                    Err(restore_err) => {
                        // Last resort: the codes are only recoverable from this log line.
                        error!(
                            "Could not restore codes for '{}' after failed delivery: {}. Codes: {:?}",
                            item, restore_err, codes
                        );
                        Err(restore_err)
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_quantity() {
        assert_eq!(resolve_quantity(None).unwrap(), 1);
        assert_eq!(resolve_quantity(Some(3)).unwrap(), 3);
        assert!(matches!(resolve_quantity(Some(0)), Err(Error::InvalidQuantity(0))));
        assert!(matches!(resolve_quantity(Some(-2)), Err(Error::InvalidQuantity(-2))));
    }
}
