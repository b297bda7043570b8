pub mod item_gates;
pub mod render;
pub mod gift_service;
pub mod stock_service;
pub mod discord;

pub use item_gates::{ItemGates, ItemGuard};
pub use gift_service::{Distribution, GiftRequest, GiftService};
pub use stock_service::{StockAdded, StockService};
