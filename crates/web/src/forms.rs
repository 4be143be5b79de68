use futbot_core::*;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::str::FromStr;

/// `POST /place_order` body. Which price fields matter depends on `order_type`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PlaceOrderForm {
    pub order_type: String,
    pub symbol: String,
    pub side: String,
    pub quantity: String,
    pub price: String,
    pub stop_price: String,
    pub limit_price: String,
}

/// `POST /check_status` body.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct StatusForm {
    pub status_symbol: String,
    pub order_id: String,
}

/// `POST /cancel_order` body.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CancelForm {
    pub cancel_symbol: String,
    pub cancel_order_id: String,
}

fn number(raw: &str, message: &str) -> Result<Decimal, String> {
    Decimal::from_str(raw.trim()).map_err(|_| message.to_string())
}

impl PlaceOrderForm {
    /// Turn the submitted fields into an order, or the message to flash.
    ///
    /// A non-positive quantity is reported before the price fields are read;
    /// prices and notional are checked by the bot's guard.
    pub fn parse(&self) -> Result<OrderRequest, String> {
        let symbol = Symbol::from_str(&self.symbol).map_err(|e| e.to_string())?;
        let side = Side::from_str(&self.side).map_err(|e| e.to_string())?;
        let quantity = number(&self.quantity, "Invalid number input for quantity.")?;
        if quantity <= Decimal::ZERO {
            return Err("Quantity must be greater than zero.".to_string());
        }

        match self.order_type.as_str() {
            "market" => Ok(OrderRequest::market(symbol, side, quantity)),
            "limit" => {
                let price = number(&self.price, "Invalid number input for limit price.")?;
                Ok(OrderRequest::limit(symbol, side, quantity, price))
            }
            "stop_limit" => {
                let message = "Invalid number input for stop price or limit price.";
                let stop_price = number(&self.stop_price, message)?;
                let limit_price = number(&self.limit_price, message)?;
                Ok(OrderRequest::stop_limit(symbol, side, quantity, limit_price, stop_price))
            }
            other => Err(ParseError::InvalidOrderType(other.to_string()).to_string()),
        }
    }
}

/// Both fields present and well formed, or `None` if either is blank.
fn lookup(symbol: &str, order_id: &str) -> Option<Result<(Symbol, OrderId), String>> {
    if symbol.trim().is_empty() || order_id.trim().is_empty() {
        return None;
    }
    let parsed = Symbol::from_str(symbol)
        .and_then(|s| OrderId::from_str(order_id).map(|id| (s, id)))
        .map_err(|e| e.to_string());
    Some(parsed)
}

impl StatusForm {
    pub fn parse(&self) -> Result<(Symbol, OrderId), String> {
        lookup(&self.status_symbol, &self.order_id)
            .unwrap_or_else(|| Err("Symbol and Order ID are required to check status.".to_string()))
    }
}

impl CancelForm {
    pub fn parse(&self) -> Result<(Symbol, OrderId), String> {
        lookup(&self.cancel_symbol, &self.cancel_order_id)
            .unwrap_or_else(|| Err("Symbol and Order ID are required to cancel order.".to_string()))
    }
}

// ---------------------------------------------------------------------------
// Result messages
// ---------------------------------------------------------------------------

/// Flash text for an accepted order.
pub fn placed_message(order: &OrderRequest, placed: &ExchangeOrder) -> String {
    match order.kind {
        OrderKind::Market => format!(
            "Market {} order placed successfully. Order ID: {}",
            order.side, placed.order_id
        ),
        OrderKind::Limit { price } => format!(
            "Limit {} order placed successfully for {} {} at {}. Order ID: {}",
            order.side,
            order.quantity.normalize(),
            order.symbol,
            price.normalize(),
            placed.order_id
        ),
        OrderKind::StopLimit { price, stop_price } => format!(
            "Stop-Limit {} order placed successfully for {} {} \
             with stop price {} and limit price {}. Order ID: {}",
            order.side,
            order.quantity.normalize(),
            order.symbol,
            stop_price.normalize(),
            price.normalize(),
            placed.order_id
        ),
    }
}

/// Flash text for an order the exchange refused.
pub fn failed_message(order: &OrderRequest, error: &impl std::fmt::Display) -> String {
    format!(
        "Failed to place {} order: {}",
        order.kind.label().to_ascii_lowercase(),
        error
    )
}
