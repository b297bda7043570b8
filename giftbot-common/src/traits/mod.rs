// File: giftbot-common/src/traits/mod.rs
pub mod notifier_traits;
pub mod repository_traits;

pub use notifier_traits::{MessageBoard, Notifier};
pub use repository_traits::{BoardRepository, InventoryRepository};
