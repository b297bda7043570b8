// ================================================================
// File: giftbot-common/src/error.rs
// ================================================================

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    // Gift / stock errors, surfaced to whoever invoked the command:
    #[error("Item '{0}' does not exist")]
    UnknownItem(String),

    #[error("Not enough stock for '{item}': requested {requested}, available {available}")]
    OutOfStock {
        item: String,
        requested: usize,
        available: usize,
    },

    #[error("Invalid quantity: {0} (must be at least 1)")]
    InvalidQuantity(i64),

    #[error("Delivery unavailable: {0}")]
    DeliveryUnavailable(String),

    #[error("Could not deliver '{item}': {cause}. {restored} code(s) were returned to stock")]
    GiftNotDelivered {
        item: String,
        restored: usize,
        #[source]
        cause: Box<Error>,
    },

    // Platform state drift, contained by the stockboard updater:
    #[error("Location unreachable: {0}")]
    LocationUnreachable(String),

    #[error("Message reference is stale: {0}")]
    ReferenceStale(String),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Platform error: {0}")]
    Platform(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// True for the failures that mean "the platform object is gone" rather
    /// than "the platform is having a bad moment".
    pub fn is_platform_drift(&self) -> bool {
        matches!(self, Error::LocationUnreachable(_) | Error::ReferenceStale(_))
    }
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Parse(s)
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Parse(s.to_string())
    }
}
