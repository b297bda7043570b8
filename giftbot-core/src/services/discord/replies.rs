//! User-facing reply texts shared by slash and prefix commands.

use std::time::Duration;

use giftbot_common::models::content::MessageContent;

use crate::Error;
use crate::services::{Distribution, StockAdded};

pub const NOT_ADMIN: &str = "❌ You are not an admin.";
pub const NO_CODES: &str =
    "❗ No codes found. Put codes after the item name separated by commas or new lines, or attach a .txt file.";
pub const GUILD_ONLY: &str = "❗ This command only works inside a server.";

/// Text and/or embed sent back to whoever ran a command.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Reply {
    pub text: Option<String>,
    pub embed: Option<MessageContent>,
}

impl Reply {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            embed: None,
        }
    }

    pub fn embed(content: MessageContent) -> Self {
        Self {
            text: None,
            embed: Some(content),
        }
    }
}

pub fn stock_added(item: &str, added: &StockAdded) -> String {
    format!(
        "✅ Added {} code(s) to **{}**. Total stock: **{}**.",
        added.added, item, added.total
    )
}

pub fn add_stock_failed(err: &Error) -> String {
    match err {
        Error::Parse(_) => NO_CODES.to_string(),
        other => format!("❌ Could not add stock: {other}"),
    }
}

pub fn gift_outcome(result: &Result<Distribution, Error>, target: &str) -> String {
    match result {
        Ok(d) => format!("✅ Gift '{}' ({} code(s)) sent to {}.", d.item, d.count(), target),
        Err(Error::UnknownItem(item)) => format!("❌ Item '{item}' does not exist."),
        Err(Error::OutOfStock { item, available: 0, .. }) => format!("⚠️ '{item}' is out of stock."),
        Err(Error::OutOfStock { requested, available, .. }) => {
            format!("⚠️ Not enough stock. Requested: {requested}, available: {available}.")
        }
        Err(Error::InvalidQuantity(q)) => format!("❗ Quantity must be at least 1 (got {q})."),
        Err(Error::GiftNotDelivered { restored, cause, .. }) => match cause.as_ref() {
            Error::DeliveryUnavailable(_) => format!(
                "❌ Could not DM {target} (DMs may be closed). {restored} code(s) were returned to stock."
            ),
            other => format!(
                "❌ Could not deliver the gift to {target}: {other}. {restored} code(s) were returned to stock."
            ),
        },
        Err(other) => format!("❌ Gift failed: {other}"),
    }
}

pub fn board_created(interval: Duration) -> String {
    format!(
        "✅ Stockboard created; it refreshes every {} seconds.",
        interval.as_secs()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gift_outcome_texts() {
        let ok = Ok(Distribution {
            item: "diamond".into(),
            codes: vec!["a1".into(), "a2".into()],
        });
        assert_eq!(gift_outcome(&ok, "bob"), "✅ Gift 'diamond' (2 code(s)) sent to bob.");

        let empty = Err(Error::OutOfStock { item: "gold".into(), requested: 1, available: 0 });
        assert_eq!(gift_outcome(&empty, "bob"), "⚠️ 'gold' is out of stock.");

        let short = Err(Error::OutOfStock { item: "gold".into(), requested: 5, available: 2 });
        assert!(gift_outcome(&short, "bob").contains("Requested: 5, available: 2"));

        let closed = Err(Error::GiftNotDelivered {
            item: "gold".into(),
            restored: 3,
            cause: Box::new(Error::DeliveryUnavailable("50007".into())),
        });
        let text = gift_outcome(&closed, "bob");
        assert!(text.contains("DMs may be closed"));
        assert!(text.contains("3 code(s) were returned to stock"));

        let outage = Err(Error::GiftNotDelivered {
            item: "gold".into(),
            restored: 1,
            cause: Box::new(Error::Platform("503 Service Unavailable".into())),
        });
        let text = gift_outcome(&outage, "bob");
        assert!(!text.contains("DMs may be closed"));
        assert!(text.contains("503 Service Unavailable"));
        assert!(text.contains("1 code(s) were returned to stock"));
    }
}
