use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ---------------------------------------------------------------------------
// Input parsing errors
// ---------------------------------------------------------------------------

/// Errors raised while turning raw user input into domain values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("Symbol is required.")]
    EmptySymbol,
    #[error("Invalid symbol: {0}")]
    InvalidSymbol(String),
    #[error("Invalid side: {0} (expected BUY or SELL)")]
    InvalidSide(String),
    #[error("Invalid order ID: {0}")]
    InvalidOrderId(String),
    #[error("Invalid order type selected.")]
    InvalidOrderType(String),
}

// ---------------------------------------------------------------------------
// Symbol & identifiers
// ---------------------------------------------------------------------------

/// A futures symbol such as `BTCUSDT`. Always upper-case ASCII alphanumerics.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Symbol(String);

impl Symbol {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Symbol {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(ParseError::EmptySymbol);
        }
        if !trimmed.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(ParseError::InvalidSymbol(trimmed.to_string()));
        }
        Ok(Self(trimmed.to_ascii_uppercase()))
    }
}

impl TryFrom<String> for Symbol {
    type Error = ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Symbol> for String {
    fn from(symbol: Symbol) -> Self {
        symbol.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Exchange-assigned order id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(pub u64);

impl FromStr for OrderId {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u64>()
            .map(OrderId)
            .map_err(|_| ParseError::InvalidOrderId(s.trim().to_string()))
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Orders
// ---------------------------------------------------------------------------

/// Order side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Buy => "BUY",
            Side::Sell => "SELL",
        }
    }
}

impl FromStr for Side {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "BUY" => Ok(Side::Buy),
            "SELL" => Ok(Side::Sell),
            other => Err(ParseError::InvalidSide(other.to_string())),
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Order type as the futures exchange names it.
///
/// A stop-limit request travels as `STOP`; `STOP_MARKET` is the stop order
/// without a limit price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderType {
    Market,
    Limit,
    Stop,
    StopMarket,
    TakeProfit,
    TakeProfitMarket,
    TrailingStopMarket,
}

impl OrderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderType::Market => "MARKET",
            OrderType::Limit => "LIMIT",
            OrderType::Stop => "STOP",
            OrderType::StopMarket => "STOP_MARKET",
            OrderType::TakeProfit => "TAKE_PROFIT",
            OrderType::TakeProfitMarket => "TAKE_PROFIT_MARKET",
            OrderType::TrailingStopMarket => "TRAILING_STOP_MARKET",
        }
    }
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How long a priced order stays on the book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TimeInForce {
    /// Good till cancelled.
    Gtc,
    /// Immediate or cancel.
    Ioc,
    /// Fill or kill.
    Fok,
    /// Good till crossing (post only).
    Gtx,
    /// Good till date.
    Gtd,
}

impl TimeInForce {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeInForce::Gtc => "GTC",
            TimeInForce::Ioc => "IOC",
            TimeInForce::Fok => "FOK",
            TimeInForce::Gtx => "GTX",
            TimeInForce::Gtd => "GTD",
        }
    }
}

/// The lifecycle state of an order on the exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    New,
    PartiallyFilled,
    Filled,
    Canceled,
    Rejected,
    Expired,
    ExpiredInMatch,
    #[serde(other)]
    Unknown,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::New => "NEW",
            OrderStatus::PartiallyFilled => "PARTIALLY_FILLED",
            OrderStatus::Filled => "FILLED",
            OrderStatus::Canceled => "CANCELED",
            OrderStatus::Rejected => "REJECTED",
            OrderStatus::Expired => "EXPIRED",
            OrderStatus::ExpiredInMatch => "EXPIRED_IN_MATCH",
            OrderStatus::Unknown => "UNKNOWN",
        }
    }

    /// Whether the order can still trade (and therefore be cancelled).
    pub fn is_working(&self) -> bool {
        matches!(self, OrderStatus::New | OrderStatus::PartiallyFilled)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the user asked for, with the prices that kind needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OrderKind {
    Market,
    Limit {
        price: Decimal,
    },
    /// `price` is the limit placed once `stop_price` trades.
    StopLimit {
        price: Decimal,
        stop_price: Decimal,
    },
}

impl OrderKind {
    pub fn label(&self) -> &'static str {
        match self {
            OrderKind::Market => "Market",
            OrderKind::Limit { .. } => "Limit",
            OrderKind::StopLimit { .. } => "Stop-Limit",
        }
    }
}

/// An order to be submitted to the exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub symbol: Symbol,
    pub side: Side,
    pub quantity: Decimal,
    pub kind: OrderKind,
    /// Optional caller-chosen id; the exchange generates one when absent.
    pub client_order_id: Option<String>,
}

impl OrderRequest {
    /// Create a new market order.
    pub fn market(symbol: Symbol, side: Side, quantity: Decimal) -> Self {
        Self {
            symbol,
            side,
            quantity,
            kind: OrderKind::Market,
            client_order_id: None,
        }
    }

    /// Create a new good-till-cancelled limit order.
    pub fn limit(symbol: Symbol, side: Side, quantity: Decimal, price: Decimal) -> Self {
        Self {
            symbol,
            side,
            quantity,
            kind: OrderKind::Limit { price },
            client_order_id: None,
        }
    }

    /// Create a new stop-limit order.
    pub fn stop_limit(
        symbol: Symbol,
        side: Side,
        quantity: Decimal,
        price: Decimal,
        stop_price: Decimal,
    ) -> Self {
        Self {
            symbol,
            side,
            quantity,
            kind: OrderKind::StopLimit { price, stop_price },
            client_order_id: None,
        }
    }

    pub fn with_client_order_id(mut self, id: impl Into<String>) -> Self {
        self.client_order_id = Some(id.into());
        self
    }

    pub fn order_type(&self) -> OrderType {
        match self.kind {
            OrderKind::Market => OrderType::Market,
            OrderKind::Limit { .. } => OrderType::Limit,
            OrderKind::StopLimit { .. } => OrderType::Stop,
        }
    }

    pub fn time_in_force(&self) -> Option<TimeInForce> {
        match self.kind {
            OrderKind::Market => None,
            OrderKind::Limit { .. } | OrderKind::StopLimit { .. } => Some(TimeInForce::Gtc),
        }
    }

    pub fn limit_price(&self) -> Option<Decimal> {
        match self.kind {
            OrderKind::Market => None,
            OrderKind::Limit { price } | OrderKind::StopLimit { price, .. } => Some(price),
        }
    }

    pub fn stop_price(&self) -> Option<Decimal> {
        match self.kind {
            OrderKind::StopLimit { stop_price, .. } => Some(stop_price),
            _ => None,
        }
    }

    /// Quantity times limit price.
    ///
    /// `None` for market orders, which carry no price, and when the product
    /// does not fit in a `Decimal`.
    pub fn notional(&self) -> Option<Decimal> {
        self.limit_price()
            .and_then(|price| self.quantity.checked_mul(price))
    }
}

/// An order as reported back by the exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeOrder {
    pub order_id: u64,
    pub symbol: String,
    pub status: OrderStatus,
    #[serde(default)]
    pub client_order_id: String,
    #[serde(default)]
    pub price: Decimal,
    #[serde(default)]
    pub avg_price: Decimal,
    pub orig_qty: Decimal,
    #[serde(default)]
    pub executed_qty: Decimal,
    #[serde(default)]
    pub cum_quote: Decimal,
    pub time_in_force: Option<TimeInForce>,
    #[serde(rename = "type")]
    pub order_type: OrderType,
    pub side: Side,
    #[serde(default)]
    pub stop_price: Decimal,
    #[serde(default)]
    pub reduce_only: bool,
    /// Milliseconds since the Unix epoch.
    #[serde(default)]
    pub update_time: i64,
}

impl ExchangeOrder {
    pub fn id(&self) -> OrderId {
        OrderId(self.order_id)
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        if self.update_time <= 0 {
            return None;
        }
        Utc.timestamp_millis_opt(self.update_time).single()
    }
}

// ---------------------------------------------------------------------------
// Account
// ---------------------------------------------------------------------------

/// One asset line of the futures wallet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetBalance {
    pub asset: String,
    pub balance: Decimal,
    #[serde(default)]
    pub available_balance: Decimal,
    #[serde(default)]
    pub cross_wallet_balance: Decimal,
    #[serde(default)]
    pub cross_un_pnl: Decimal,
    #[serde(default)]
    pub update_time: i64,
}

impl AssetBalance {
    pub fn new(asset: &str, balance: Decimal) -> Self {
        Self {
            asset: asset.to_string(),
            balance,
            available_balance: balance,
            cross_wallet_balance: balance,
            cross_un_pnl: Decimal::ZERO,
            update_time: 0,
        }
    }

    pub fn has_funds(&self) -> bool {
        self.balance > Decimal::ZERO
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn btc() -> Symbol {
        "btcusdt".parse().unwrap()
    }

    #[test]
    fn test_symbol_normalized() {
        assert_eq!(btc().as_str(), "BTCUSDT");
        assert_eq!(" ethusdt ".parse::<Symbol>().unwrap().as_str(), "ETHUSDT");
        assert_eq!("".parse::<Symbol>(), Err(ParseError::EmptySymbol));
        assert!(matches!(
            "BTC/USDT".parse::<Symbol>(),
            Err(ParseError::InvalidSymbol(_))
        ));
    }

    #[test]
    fn test_side_parsing() {
        assert_eq!("buy".parse::<Side>().unwrap(), Side::Buy);
        assert_eq!(" SELL".parse::<Side>().unwrap(), Side::Sell);
        assert!("hold".parse::<Side>().is_err());
    }

    #[test]
    fn test_order_id_parsing() {
        assert_eq!("  4242 ".parse::<OrderId>().unwrap(), OrderId(4242));
        assert_eq!(
            "abc".parse::<OrderId>(),
            Err(ParseError::InvalidOrderId("abc".to_string()))
        );
    }

    #[test]
    fn test_stop_limit_travels_as_stop() {
        let order =
            OrderRequest::stop_limit(btc(), Side::Sell, dec!(0.01), dec!(59000), dec!(59500));
        assert_eq!(order.order_type(), OrderType::Stop);
        assert_eq!(order.time_in_force(), Some(TimeInForce::Gtc));
        assert_eq!(order.limit_price(), Some(dec!(59000)));
        assert_eq!(order.stop_price(), Some(dec!(59500)));
        assert_eq!(order.notional(), Some(dec!(590.00)));
    }

    #[test]
    fn test_market_order_has_no_notional() {
        let order = OrderRequest::market(btc(), Side::Buy, dec!(1));
        assert_eq!(order.notional(), None);
        assert_eq!(order.time_in_force(), None);
    }

    #[test]
    fn test_exchange_order_from_wire() {
        let body = r#"{
            "orderId": 4028187365,
            "symbol": "BTCUSDT",
            "status": "NEW",
            "clientOrderId": "x-abc",
            "price": "60000.00",
            "avgPrice": "0.00",
            "origQty": "0.010",
            "executedQty": "0.000",
            "cumQuote": "0.00000",
            "timeInForce": "GTC",
            "type": "LIMIT",
            "reduceOnly": false,
            "side": "BUY",
            "stopPrice": "0.00",
            "workingType": "CONTRACT_PRICE",
            "updateTime": 1718000000000
        }"#;
        let order: ExchangeOrder = serde_json::from_str(body).unwrap();
        assert_eq!(order.id(), OrderId(4028187365));
        assert_eq!(order.status, OrderStatus::New);
        assert_eq!(order.order_type, OrderType::Limit);
        assert_eq!(order.price, dec!(60000));
        assert_eq!(order.orig_qty, dec!(0.01));
        assert!(order.updated_at().is_some());
    }

    #[test]
    fn test_unrecognised_status_maps_to_unknown() {
        let status: OrderStatus = serde_json::from_str("\"PENDING_NEW\"").unwrap();
        assert_eq!(status, OrderStatus::Unknown);
    }

    #[test]
    fn test_balance_from_wire() {
        let body = r#"[
            {"accountAlias":"SgsR","asset":"USDT","balance":"15000.00000000",
             "crossWalletBalance":"15000.00000000","crossUnPnl":"0.00000000",
             "availableBalance":"14000.00000000","maxWithdrawAmount":"14000.00000000",
             "marginAvailable":true,"updateTime":1718000000000},
            {"accountAlias":"SgsR","asset":"BNB","balance":"0.00000000",
             "crossWalletBalance":"0.00000000","crossUnPnl":"0.00000000",
             "availableBalance":"0.00000000","maxWithdrawAmount":"0.00000000",
             "marginAvailable":true,"updateTime":0}
        ]"#;
        let balances: Vec<AssetBalance> = serde_json::from_str(body).unwrap();
        let funded: Vec<_> = balances.iter().filter(|b| b.has_funds()).collect();
        assert_eq!(funded.len(), 1);
        assert_eq!(funded[0].asset, "USDT");
        assert_eq!(funded[0].available_balance, dec!(14000));
    }
}
