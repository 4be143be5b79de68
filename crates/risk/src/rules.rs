use crate::profiles::OrderLimits;
use futbot_core::*;
use rust_decimal::{Decimal, RoundingStrategy};
use tracing::warn;

/// Rejects orders with non-positive sizes or prices, or below the notional floor.
#[derive(Debug, Clone)]
pub struct OrderGuard {
    limits: OrderLimits,
}

impl OrderGuard {
    pub fn new(limits: OrderLimits) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> &OrderLimits {
        &self.limits
    }

    fn check_quantity(&self, order: &OrderRequest) -> Option<String> {
        if order.quantity <= Decimal::ZERO {
            return Some("Quantity must be greater than zero.".to_string());
        }
        None
    }

    fn check_prices(&self, order: &OrderRequest) -> Option<String> {
        match order.kind {
            OrderKind::Market => None,
            OrderKind::Limit { price } if price <= Decimal::ZERO => {
                Some("Limit price must be greater than zero.".to_string())
            }
            OrderKind::StopLimit { price, stop_price }
                if price <= Decimal::ZERO || stop_price <= Decimal::ZERO =>
            {
                Some("Stop price and Limit price must be greater than zero.".to_string())
            }
            _ => None,
        }
    }

    /// Stop-limit orders are measured at their limit price.
    fn check_notional(&self, order: &OrderRequest) -> Option<String> {
        order.limit_price()?;
        let Some(notional) = order.notional() else {
            return Some("Order notional value is too large.".to_string());
        };
        if notional < self.limits.min_notional {
            return Some(format!(
                "Order notional value ({:.2} {quote}) is too small. Must be at least {} {quote}.",
                notional.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero),
                self.limits.min_notional,
                quote = self.limits.quote_asset,
            ));
        }
        None
    }
}

impl Default for OrderGuard {
    fn default() -> Self {
        Self::new(OrderLimits::default())
    }
}

impl RiskManager for OrderGuard {
    fn evaluate_order(&self, order: &OrderRequest) -> RiskDecision {
        let violation = self
            .check_quantity(order)
            .or_else(|| self.check_prices(order))
            .or_else(|| self.check_notional(order));

        match violation {
            Some(reason) => {
                warn!(
                    symbol = %order.symbol,
                    side = %order.side,
                    order_type = %order.order_type(),
                    %reason,
                    "Order rejected before submission"
                );
                RiskDecision::Rejected(reason)
            }
            None => RiskDecision::Approved,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn btc() -> Symbol {
        "BTCUSDT".parse().unwrap()
    }

    fn rejection(decision: RiskDecision) -> String {
        match decision {
            RiskDecision::Rejected(msg) => msg,
            RiskDecision::Approved => panic!("Expected rejection"),
        }
    }

    #[test]
    fn test_zero_quantity_rejected() {
        let guard = OrderGuard::default();
        let order = OrderRequest::market(btc(), Side::Buy, dec!(0));
        assert_eq!(
            rejection(guard.evaluate_order(&order)),
            "Quantity must be greater than zero."
        );
    }

    #[test]
    fn test_market_order_skips_notional() {
        let guard = OrderGuard::default();
        let order = OrderRequest::market(btc(), Side::Sell, dec!(0.001));
        assert_eq!(guard.evaluate_order(&order), RiskDecision::Approved);
    }

    #[test]
    fn test_negative_limit_price_rejected() {
        let guard = OrderGuard::default();
        let order = OrderRequest::limit(btc(), Side::Buy, dec!(1), dec!(-5));
        assert_eq!(
            rejection(guard.evaluate_order(&order)),
            "Limit price must be greater than zero."
        );
    }

    #[test]
    fn test_stop_limit_requires_both_prices() {
        let guard = OrderGuard::default();
        let order = OrderRequest::stop_limit(btc(), Side::Buy, dec!(1), dec!(61000), dec!(0));
        assert_eq!(
            rejection(guard.evaluate_order(&order)),
            "Stop price and Limit price must be greater than zero."
        );
    }

    #[test]
    fn test_small_notional_rejected() {
        let guard = OrderGuard::default();
        // 0.001 * 12345.678 = 12.345678
        let order = OrderRequest::limit(btc(), Side::Buy, dec!(0.001), dec!(12345.678));
        assert_eq!(
            rejection(guard.evaluate_order(&order)),
            "Order notional value (12.35 USDT) is too small. Must be at least 100 USDT."
        );
    }

    #[test]
    fn test_overflowing_notional_rejected() {
        let guard = OrderGuard::default();
        let order = OrderRequest::limit(btc(), Side::Buy, Decimal::MAX, dec!(2));
        assert_eq!(
            rejection(guard.evaluate_order(&order)),
            "Order notional value is too large."
        );

        let order = OrderRequest::stop_limit(btc(), Side::Sell, dec!(2), Decimal::MAX, dec!(1));
        assert_eq!(
            rejection(guard.evaluate_order(&order)),
            "Order notional value is too large."
        );
    }

    #[test]
    fn test_stop_limit_notional_uses_limit_price() {
        let guard = OrderGuard::default();
        // Stop alone would clear the floor; the limit price does not.
        let order = OrderRequest::stop_limit(btc(), Side::Buy, dec!(1), dec!(99), dec!(150));
        assert!(rejection(guard.evaluate_order(&order)).contains("is too small"));

        let order = OrderRequest::stop_limit(btc(), Side::Buy, dec!(1), dec!(100), dec!(50));
        assert_eq!(guard.evaluate_order(&order), RiskDecision::Approved);
    }

    #[test]
    fn test_unrestricted_limits_only_check_positivity() {
        let guard = OrderGuard::new(OrderLimits::unrestricted());
        let order = OrderRequest::limit(btc(), Side::Sell, dec!(0.001), dec!(1));
        assert_eq!(guard.evaluate_order(&order), RiskDecision::Approved);
    }

    #[test]
    fn test_limits_from_partial_toml() {
        let limits: OrderLimits = toml::from_str("min_notional = \"5\"").unwrap();
        assert_eq!(limits.min_notional, dec!(5));
        assert_eq!(limits.quote_asset, "USDT");
    }
}
