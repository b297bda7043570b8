// src/repositories/mod.rs

pub mod json;

pub use json::{JsonBoardRepository, JsonInventoryRepository};
