use async_trait::async_trait;
use chrono::Utc;
use futbot_core::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Configuration for the paper exchange.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PaperExchangeConfig {
    /// Starting wallet (asset → balance).
    pub balances: BTreeMap<String, Decimal>,
    /// Price market orders fill at, per symbol.
    pub mark_prices: BTreeMap<String, Decimal>,
}

impl PaperExchangeConfig {
    pub fn with_balance(mut self, asset: &str, amount: Decimal) -> Self {
        self.balances.insert(asset.to_string(), amount);
        self
    }

    pub fn with_mark_price(mut self, symbol: &str, price: Decimal) -> Self {
        self.mark_prices.insert(symbol.to_ascii_uppercase(), price);
        self
    }
}

#[derive(Debug, Clone)]
struct PaperOrder {
    order: ExchangeOrder,
    /// Stop orders behave as limits once triggered.
    triggered: bool,
}

#[derive(Debug, Default)]
struct Book {
    next_id: u64,
    orders: HashMap<u64, PaperOrder>,
    mark_prices: HashMap<String, Decimal>,
}

/// An in-memory futures venue.
///
/// Market orders fill immediately at the symbol's mark price; limit and
/// stop-limit orders rest until [`PaperExchange::set_mark_price`] crosses them.
pub struct PaperExchange {
    balances: Vec<AssetBalance>,
    book: Mutex<Book>,
}

impl PaperExchange {
    pub fn new(config: PaperExchangeConfig) -> Self {
        let balances = config
            .balances
            .iter()
            .map(|(asset, amount)| AssetBalance::new(asset, *amount))
            .collect();
        let book = Book {
            next_id: 1,
            orders: HashMap::new(),
            mark_prices: config.mark_prices.into_iter().collect(),
        };
        Self {
            balances,
            book: Mutex::new(book),
        }
    }

    /// Move the mark price and fill any resting orders it crosses.
    pub async fn set_mark_price(&self, symbol: &Symbol, price: Decimal) {
        let mut book = self.book.lock().await;
        book.mark_prices.insert(symbol.to_string(), price);
        let now = Utc::now().timestamp_millis();

        for paper in book.orders.values_mut() {
            if paper.order.symbol != symbol.as_str() || !paper.order.status.is_working() {
                continue;
            }
            if paper.order.order_type == OrderType::Stop && !paper.triggered {
                paper.triggered = match paper.order.side {
                    Side::Buy => price >= paper.order.stop_price,
                    Side::Sell => price <= paper.order.stop_price,
                };
                if paper.triggered {
                    debug!(order_id = paper.order.order_id, "Paper stop triggered");
                }
            }
            let resting_limit = paper.order.order_type == OrderType::Limit || paper.triggered;
            let limit = paper.order.price;
            if !(resting_limit && crosses(paper.order.side, limit, price)) {
                continue;
            }
            if let Err(e) = fill(&mut paper.order, limit, now) {
                warn!(order_id = paper.order.order_id, error = %e, "Paper order left unfilled");
            } else {
                info!(
                    order_id = paper.order.order_id,
                    symbol = %paper.order.symbol,
                    price = %paper.order.price,
                    "Paper order filled"
                );
            }
        }
    }
}

/// A resting limit fills once the market trades through its price.
fn crosses(side: Side, limit: Decimal, mark: Decimal) -> bool {
    match side {
        Side::Buy => mark <= limit,
        Side::Sell => mark >= limit,
    }
}

/// Fill the whole quantity at `price`. The order is untouched on error.
fn fill(order: &mut ExchangeOrder, price: Decimal, now: i64) -> Result<(), ExchangeError> {
    let cum_quote = order
        .orig_qty
        .checked_mul(price)
        .ok_or_else(|| rejected(-1013, "Filter failure: NOTIONAL"))?;
    order.status = OrderStatus::Filled;
    order.executed_qty = order.orig_qty;
    order.avg_price = price;
    order.cum_quote = cum_quote;
    order.update_time = now;
    Ok(())
}

fn rejected(code: i64, msg: &str) -> ExchangeError {
    ExchangeError::Api {
        status: 400,
        code,
        msg: msg.to_string(),
    }
}

#[async_trait]
impl FuturesExchange for PaperExchange {
    fn name(&self) -> &str {
        "paper"
    }

    async fn ping(&self) -> Result<(), ExchangeError> {
        Ok(())
    }

    async fn account_balances(&self) -> Result<Vec<AssetBalance>, ExchangeError> {
        Ok(self.balances.clone())
    }

    async fn place_order(&self, request: &OrderRequest) -> Result<ExchangeOrder, ExchangeError> {
        let mut book = self.book.lock().await;
        // Market orders fill at the mark; without one the symbol is unknown.
        let mark = match request.kind {
            OrderKind::Market => match book.mark_prices.get(request.symbol.as_str()) {
                Some(mark) => Some(*mark),
                None => return Err(rejected(-1121, "Invalid symbol.")),
            },
            _ => None,
        };
        let order_id = book.next_id;
        book.next_id += 1;
        let now = Utc::now().timestamp_millis();

        let mut order = ExchangeOrder {
            order_id,
            symbol: request.symbol.to_string(),
            status: OrderStatus::New,
            client_order_id: request
                .client_order_id
                .clone()
                .unwrap_or_else(|| format!("paper-{}", Uuid::new_v4().simple())),
            price: request.limit_price().unwrap_or(Decimal::ZERO),
            avg_price: Decimal::ZERO,
            orig_qty: request.quantity,
            executed_qty: Decimal::ZERO,
            cum_quote: Decimal::ZERO,
            time_in_force: request.time_in_force(),
            order_type: request.order_type(),
            side: request.side,
            stop_price: request.stop_price().unwrap_or(Decimal::ZERO),
            reduce_only: false,
            update_time: now,
        };

        if let Some(mark) = mark {
            fill(&mut order, mark, now)?;
        }

        book.orders.insert(
            order_id,
            PaperOrder {
                order: order.clone(),
                triggered: false,
            },
        );
        Ok(order)
    }

    async fn order_status(
        &self,
        symbol: &Symbol,
        order_id: OrderId,
    ) -> Result<ExchangeOrder, ExchangeError> {
        let book = self.book.lock().await;
        book.orders
            .get(&order_id.0)
            .filter(|p| p.order.symbol == symbol.as_str())
            .map(|p| p.order.clone())
            .ok_or_else(|| rejected(-2013, "Order does not exist."))
    }

    async fn cancel_order(
        &self,
        symbol: &Symbol,
        order_id: OrderId,
    ) -> Result<ExchangeOrder, ExchangeError> {
        let mut book = self.book.lock().await;
        match book.orders.get_mut(&order_id.0) {
            Some(paper)
                if paper.order.symbol == symbol.as_str() && paper.order.status.is_working() =>
            {
                paper.order.status = OrderStatus::Canceled;
                paper.order.update_time = Utc::now().timestamp_millis();
                Ok(paper.order.clone())
            }
            _ => Err(rejected(-2011, "Unknown order sent.")),
        }
    }
}
