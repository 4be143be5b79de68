//! The trading client: a guarded, logged facade over a [`FuturesExchange`].
//!
//! [`FuturesExchange`]: futbot_core::FuturesExchange

pub mod bot;

pub use bot::{BotError, TradingBot};
