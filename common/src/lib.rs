pub mod cart;
pub mod catalog;
pub mod config;
pub mod coverage;
pub mod currency;
pub mod error;
pub mod export;
pub mod geography;
pub mod identity;
pub mod import;
pub mod message;
pub mod notification;
pub mod order;
pub mod product;
pub mod store;

#[cfg(test)]
mod testing;

pub use config::MarketConfig;
pub use error::{ImportError, MarketError, StoreError};
