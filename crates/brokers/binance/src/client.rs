use async_trait::async_trait;
use futbot_core::*;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Method, Response};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::BinanceConfig;
use crate::signing::{signed_query, timestamp_ms};

const API_KEY_HEADER: &str = "x-mbx-apikey";

/// Signed REST client for USDⓈ-M futures.
///
/// One request per call, no retries: failures are mapped to [`ExchangeError`]
/// and handed back to the caller.
pub struct BinanceFuturesClient {
    http: reqwest::Client,
    config: BinanceConfig,
    name: String,
}

impl BinanceFuturesClient {
    pub fn new(config: BinanceConfig) -> Result<Self, ExchangeError> {
        let mut headers = HeaderMap::new();
        let key = HeaderValue::from_str(&config.api_key)
            .map_err(|_| ExchangeError::Config("API key contains invalid characters".into()))?;
        headers.insert(API_KEY_HEADER, key);

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| ExchangeError::Config(format!("HTTP client: {}", e)))?;

        let name = if config.is_testnet() {
            "binance-futures-testnet"
        } else {
            "binance-futures"
        }
        .to_string();

        info!(base_url = %config.base_url, "Binance futures client ready");
        Ok(Self { http, config, name })
    }

    pub fn config(&self) -> &BinanceConfig {
        &self.config
    }

    fn url(&self, path: &str, query: &str) -> String {
        let base = self.config.base_url.trim_end_matches('/');
        if query.is_empty() {
            format!("{base}{path}")
        } else {
            format!("{base}{path}?{query}")
        }
    }

    async fn send_public<T: DeserializeOwned>(&self, path: &str) -> Result<T, ExchangeError> {
        debug!(path, "GET (public)");
        let resp = self
            .http
            .get(self.url(path, ""))
            .send()
            .await
            .map_err(transport)?;
        read_json(resp).await
    }

    async fn send_signed<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        params: &[(&'static str, String)],
    ) -> Result<T, ExchangeError> {
        let query = encode_params(params);
        debug!(%method, path, params = %query, "Signed request");
        let signed = signed_query(
            &self.config.api_secret,
            &query,
            self.config.recv_window_ms,
            timestamp_ms(),
        )?;
        let resp = self
            .http
            .request(method, self.url(path, &signed))
            .send()
            .await
            .map_err(transport)?;
        read_json(resp).await
    }
}

#[async_trait]
impl FuturesExchange for BinanceFuturesClient {
    fn name(&self) -> &str {
        &self.name
    }

    async fn ping(&self) -> Result<(), ExchangeError> {
        let _: serde_json::Value = self.send_public("/fapi/v1/ping").await?;
        Ok(())
    }

    async fn account_balances(&self) -> Result<Vec<AssetBalance>, ExchangeError> {
        self.send_signed(Method::GET, "/fapi/v2/balance", &[]).await
    }

    async fn place_order(&self, order: &OrderRequest) -> Result<ExchangeOrder, ExchangeError> {
        self.send_signed(Method::POST, "/fapi/v1/order", &order_params(order))
            .await
    }

    async fn order_status(
        &self,
        symbol: &Symbol,
        order_id: OrderId,
    ) -> Result<ExchangeOrder, ExchangeError> {
        self.send_signed(Method::GET, "/fapi/v1/order", &lookup_params(symbol, order_id))
            .await
    }

    async fn cancel_order(
        &self,
        symbol: &Symbol,
        order_id: OrderId,
    ) -> Result<ExchangeOrder, ExchangeError> {
        self.send_signed(Method::DELETE, "/fapi/v1/order", &lookup_params(symbol, order_id))
            .await
    }
}

// ---------------------------------------------------------------------------
// Request parameters
// ---------------------------------------------------------------------------

/// Parameters for `POST /fapi/v1/order`, in the order they are signed.
pub fn order_params(order: &OrderRequest) -> Vec<(&'static str, String)> {
    let mut params = vec![
        ("symbol", order.symbol.to_string()),
        ("side", order.side.as_str().to_string()),
        ("type", order.order_type().as_str().to_string()),
        ("quantity", fmt_decimal(order.quantity)),
    ];
    if let Some(price) = order.limit_price() {
        params.push(("price", fmt_decimal(price)));
    }
    if let Some(stop_price) = order.stop_price() {
        params.push(("stopPrice", fmt_decimal(stop_price)));
    }
    if let Some(tif) = order.time_in_force() {
        params.push(("timeInForce", tif.as_str().to_string()));
    }
    if let Some(id) = &order.client_order_id {
        params.push(("newClientOrderId", id.clone()));
    }
    params
}

fn lookup_params(symbol: &Symbol, order_id: OrderId) -> Vec<(&'static str, String)> {
    vec![
        ("symbol", symbol.to_string()),
        ("orderId", order_id.to_string()),
    ]
}

fn encode_params(params: &[(&'static str, String)]) -> String {
    url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(params.iter().map(|(k, v)| (*k, v.as_str())))
        .finish()
}

/// `0.0100` → `0.01`; the exchange rejects precision beyond the symbol's step.
fn fmt_decimal(value: Decimal) -> String {
    value.normalize().to_string()
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

/// Longest response excerpt kept in an [`ExchangeError`].
const MAX_BODY_EXCERPT: usize = 512;

#[derive(Deserialize)]
struct ApiErrorBody {
    code: i64,
    msg: String,
}

fn transport(e: reqwest::Error) -> ExchangeError {
    ExchangeError::Transport(e.to_string())
}

/// Map a failed response body to an error, preferring the `{code, msg}` envelope.
pub fn api_error(status: u16, body: &str) -> ExchangeError {
    match serde_json::from_str::<ApiErrorBody>(body) {
        Ok(err) => ExchangeError::Api {
            status,
            code: err.code,
            msg: err.msg,
        },
        Err(_) => ExchangeError::Http {
            status,
            body: excerpt(body),
        },
    }
}

/// First `MAX_BODY_EXCERPT` characters of a response body.
fn excerpt(body: &str) -> String {
    match body.char_indices().nth(MAX_BODY_EXCERPT) {
        Some((cut, _)) => format!("{}... ({} bytes)", &body[..cut], body.len()),
        None => body.to_string(),
    }
}

async fn read_json<T: DeserializeOwned>(resp: Response) -> Result<T, ExchangeError> {
    let status = resp.status();
    let body = resp.text().await.map_err(transport)?;
    if !status.is_success() {
        let err = api_error(status.as_u16(), &body);
        warn!(status = status.as_u16(), error = %err, "Exchange returned an error");
        return Err(err);
    }
    debug!(status = status.as_u16(), body = %body, "Exchange response");
    serde_json::from_str(&body)
        .map_err(|e| ExchangeError::Decode(format!("{}: {}", e, excerpt(&body))))
}
