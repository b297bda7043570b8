// src/lib.rs

pub mod repositories;
pub mod platforms;
pub mod tasks;
pub mod services;
pub mod test_utils;

pub use giftbot_common::error::Error;
