//! Binance USDⓈ-M Futures adapter.
//!
//! Direct REST integration with signed (HMAC-SHA256) endpoints for order
//! placement, lookup and cancellation. Defaults to the futures testnet.

pub mod client;
pub mod config;
pub mod signing;

pub use client::BinanceFuturesClient;
pub use config::{BinanceConfig, MAINNET_BASE_URL, TESTNET_BASE_URL};
