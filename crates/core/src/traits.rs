use crate::models::*;
use async_trait::async_trait;

// ---------------------------------------------------------------------------
// Exchange Trait
// ---------------------------------------------------------------------------

/// Errors that can occur while talking to an exchange.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExchangeError {
    /// The exchange understood the call and refused it.
    #[error("APIError(code={code}): {msg}")]
    Api { status: u16, code: i64, msg: String },
    /// Non-success response without the exchange's error envelope.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },
    #[error("Request failed: {0}")]
    Transport(String),
    #[error("Invalid response: {0}")]
    Decode(String),
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ExchangeError {
    /// Exchange error code, when the exchange supplied one.
    pub fn code(&self) -> Option<i64> {
        match self {
            ExchangeError::Api { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// `-2011` (unknown order sent) or `-2013` (order does not exist).
    pub fn is_unknown_order(&self) -> bool {
        matches!(self.code(), Some(-2011) | Some(-2013))
    }
}

/// A futures venue that can take, report on and cancel orders.
///
/// Methods take `&self` so one client can be shared by every request handler.
#[async_trait]
pub trait FuturesExchange: Send + Sync {
    /// Short name used in logs (e.g. "binance-testnet").
    fn name(&self) -> &str;

    /// Check connectivity.
    async fn ping(&self) -> Result<(), ExchangeError>;

    /// All wallet assets, including empty ones.
    async fn account_balances(&self) -> Result<Vec<AssetBalance>, ExchangeError>;

    /// Submit a new order.
    async fn place_order(&self, order: &OrderRequest) -> Result<ExchangeOrder, ExchangeError>;

    /// Look up an order by id.
    async fn order_status(
        &self,
        symbol: &Symbol,
        order_id: OrderId,
    ) -> Result<ExchangeOrder, ExchangeError>;

    /// Cancel a working order. Returns the order in its cancelled state.
    async fn cancel_order(
        &self,
        symbol: &Symbol,
        order_id: OrderId,
    ) -> Result<ExchangeOrder, ExchangeError>;
}

// ---------------------------------------------------------------------------
// Risk Manager Trait
// ---------------------------------------------------------------------------

/// Outcome of a pre-trade check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RiskDecision {
    /// Order is approved.
    Approved,
    /// Order is rejected with a user-facing reason.
    Rejected(String),
}

/// Evaluates orders before they are sent to the exchange.
pub trait RiskManager: Send + Sync {
    fn evaluate_order(&self, order: &OrderRequest) -> RiskDecision;
}
