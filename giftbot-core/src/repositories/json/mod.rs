pub mod document;
pub mod inventory;
pub mod boards;

pub use document::JsonDocument;
pub use inventory::JsonInventoryRepository;
pub use boards::JsonBoardRepository;
