use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Order-size limits applied before anything reaches the exchange.
///
/// Deserializes from the `[risk]` table of the config file; missing fields
/// fall back to [`OrderLimits::usdt_futures`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrderLimits {
    pub name: String,
    /// Smallest accepted quantity × price for priced orders.
    pub min_notional: Decimal,
    /// Currency the notional is quoted in (for messages only).
    pub quote_asset: String,
}

impl OrderLimits {
    /// USDⓈ-margined futures: 100 USDT minimum notional.
    pub fn usdt_futures() -> Self {
        Self {
            name: "USDT Futures".to_string(),
            min_notional: dec!(100),
            quote_asset: "USDT".to_string(),
        }
    }

    /// No notional floor; only positivity is enforced.
    pub fn unrestricted() -> Self {
        Self {
            name: "Unrestricted".to_string(),
            min_notional: Decimal::ZERO,
            quote_asset: "USDT".to_string(),
        }
    }
}

impl Default for OrderLimits {
    fn default() -> Self {
        Self::usdt_futures()
    }
}
