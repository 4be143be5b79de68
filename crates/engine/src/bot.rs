use futbot_core::*;
use futbot_risk::OrderGuard;
use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info};

/// Why a bot operation did not complete.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BotError {
    /// Refused locally before anything was sent.
    #[error("{0}")]
    Rejected(String),
    #[error(transparent)]
    Exchange(#[from] ExchangeError),
}

/// Places, inspects and cancels futures orders on one exchange.
///
/// Every call is logged as a request/response pair; order placement runs the
/// [`OrderGuard`] first. Exactly one exchange call is made per operation.
pub struct TradingBot {
    exchange: Arc<dyn FuturesExchange>,
    guard: OrderGuard,
}

impl TradingBot {
    /// Wrap an exchange without touching the network.
    pub fn new(exchange: Arc<dyn FuturesExchange>, guard: OrderGuard) -> Self {
        Self { exchange, guard }
    }

    /// Ping the exchange and log the wallet. Fails if either call fails.
    pub async fn connect(
        exchange: Arc<dyn FuturesExchange>,
        guard: OrderGuard,
    ) -> Result<Self, BotError> {
        let bot = Self::new(exchange, guard);
        let venue = bot.exchange.name().to_string();

        if let Err(e) = bot.exchange.ping().await {
            error!(venue = %venue, error = %e, "Failed to connect to exchange");
            return Err(e.into());
        }
        info!(venue = %venue, "Successfully connected to exchange");

        let balances = bot.account_balances().await?;
        for b in &balances {
            info!(
                asset = %b.asset,
                balance = %b.balance,
                available = %b.available_balance,
                "Account balance"
            );
        }
        Ok(bot)
    }

    pub fn exchange_name(&self) -> &str {
        self.exchange.name()
    }

    pub fn guard(&self) -> &OrderGuard {
        &self.guard
    }

    pub async fn place_market_order(
        &self,
        symbol: Symbol,
        side: Side,
        quantity: Decimal,
    ) -> Result<ExchangeOrder, BotError> {
        self.submit(OrderRequest::market(symbol, side, quantity)).await
    }

    /// Good-till-cancelled limit order.
    pub async fn place_limit_order(
        &self,
        symbol: Symbol,
        side: Side,
        quantity: Decimal,
        price: Decimal,
    ) -> Result<ExchangeOrder, BotError> {
        self.submit(OrderRequest::limit(symbol, side, quantity, price))
            .await
    }

    /// A `STOP` order: once `stop_price` trades, a GTC limit at `price` is worked.
    pub async fn place_stop_limit_order(
        &self,
        symbol: Symbol,
        side: Side,
        quantity: Decimal,
        price: Decimal,
        stop_price: Decimal,
    ) -> Result<ExchangeOrder, BotError> {
        self.submit(OrderRequest::stop_limit(symbol, side, quantity, price, stop_price))
            .await
    }

    pub async fn order_status(
        &self,
        symbol: &Symbol,
        order_id: OrderId,
    ) -> Result<ExchangeOrder, BotError> {
        info!(symbol = %symbol, order_id = %order_id, "Request: order_status with params");
        let result = self.exchange.order_status(symbol, order_id).await;
        let order = logged("order_status", result)?;
        info!(
            order_id = %order_id,
            symbol = %symbol,
            status = %order.status,
            updated_at = ?order.updated_at(),
            "Order status retrieved"
        );
        Ok(order)
    }

    pub async fn cancel_order(
        &self,
        symbol: &Symbol,
        order_id: OrderId,
    ) -> Result<ExchangeOrder, BotError> {
        info!(symbol = %symbol, order_id = %order_id, "Request: cancel_order with params");
        let result = self.exchange.cancel_order(symbol, order_id).await;
        let order = logged("cancel_order", result)?;
        info!(order_id = %order_id, symbol = %symbol, "Order cancelled successfully");
        Ok(order)
    }

    /// Wallet assets holding a positive balance.
    pub async fn account_balances(&self) -> Result<Vec<AssetBalance>, BotError> {
        info!("Request: account_balances with params: none");
        let result = self.exchange.account_balances().await;
        let balances = logged("account_balances", result)?;
        Ok(balances.into_iter().filter(AssetBalance::has_funds).collect())
    }

    async fn submit(&self, order: OrderRequest) -> Result<ExchangeOrder, BotError> {
        let operation = match order.kind {
            OrderKind::Market => "place_market_order",
            OrderKind::Limit { .. } => "place_limit_order",
            OrderKind::StopLimit { .. } => "place_stop_limit_order",
        };
        info!(params = %to_json(&order), "Request: {} with params", operation);

        if let RiskDecision::Rejected(reason) = self.guard.evaluate_order(&order) {
            return Err(BotError::Rejected(reason));
        }

        let result = self.exchange.place_order(&order).await;
        let placed = logged(operation, result)?;
        info!("{}", placed_summary(&order, &placed));
        Ok(placed)
    }
}

/// Log the outcome of one exchange call.
fn logged<T: Serialize>(operation: &str, result: Result<T, ExchangeError>) -> Result<T, BotError> {
    match result {
        Ok(value) => {
            info!(response = %to_json(&value), "Response: {}", operation);
            Ok(value)
        }
        Err(e) => {
            error!(error = %e, code = ?e.code(), "Error in {}", operation);
            Err(e.into())
        }
    }
}

fn to_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|e| format!("<unserializable: {}>", e))
}

/// One-line description of an accepted order.
pub fn placed_summary(order: &OrderRequest, placed: &ExchangeOrder) -> String {
    match order.kind {
        OrderKind::Market => format!(
            "Market {} order for {} {} placed successfully. Order ID: {}",
            order.side, order.quantity, order.symbol, placed.order_id
        ),
        OrderKind::Limit { price } => format!(
            "Limit {} order for {} {} at {} placed successfully. Order ID: {}",
            order.side, order.quantity, order.symbol, price, placed.order_id
        ),
        OrderKind::StopLimit { price, stop_price } => format!(
            "Stop-Limit {} order for {} {} (stop {}, limit {}) placed successfully. Order ID: {}",
            order.side, order.quantity, order.symbol, stop_price, price, placed.order_id
        ),
    }
}
