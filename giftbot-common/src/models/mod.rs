// File: giftbot-common/src/models/mod.rs
pub mod inventory;
pub mod board;
pub mod content;

pub use inventory::{normalize_item, Inventory};
pub use board::{Board, BoardKey, BoardMap};
pub use content::{ContentAttachment, ContentField, Delivered, MessageContent, Recipient};
