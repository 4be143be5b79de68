//! Drives `BinanceFuturesClient` against an in-process mock of the futures REST API.

use axum::extract::{RawQuery, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use futbot_brokers_binance::signing::sign;
use futbot_brokers_binance::{BinanceConfig, BinanceFuturesClient};
use futbot_core::*;
use rust_decimal_macros::dec;
use serde_json::json;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

const KEY: &str = "test-api-key";
const SECRET: &str = "test-api-secret";

#[derive(Clone, Default)]
struct Recorder {
    queries: Arc<Mutex<Vec<String>>>,
}

impl Recorder {
    fn last(&self) -> HashMap<String, String> {
        let queries = self.queries.lock().unwrap();
        let raw = queries.last().cloned().unwrap_or_default();
        url::form_urlencoded::parse(raw.as_bytes())
            .into_owned()
            .collect()
    }
}

fn rejected(code: i64, msg: &str) -> Response {
    (StatusCode::BAD_REQUEST, Json(json!({ "code": code, "msg": msg }))).into_response()
}

/// Checks the key header and that `signature` covers everything before it.
fn authenticate(
    recorder: &Recorder,
    headers: &HeaderMap,
    query: Option<String>,
) -> Result<HashMap<String, String>, Response> {
    if headers.get("x-mbx-apikey").and_then(|v| v.to_str().ok()) != Some(KEY) {
        return Err(rejected(-2015, "Invalid API-key, IP, or permissions for action."));
    }
    let raw = query.unwrap_or_default();
    let (payload, signature) = raw
        .rsplit_once("&signature=")
        .ok_or_else(|| rejected(-1102, "Mandatory parameter 'signature' was not sent."))?;
    if sign(SECRET, payload).unwrap() != signature {
        return Err(rejected(-1022, "Signature for this request is not valid."));
    }
    recorder.queries.lock().unwrap().push(raw.clone());
    Ok(url::form_urlencoded::parse(raw.as_bytes()).into_owned().collect())
}

fn order_json(params: &HashMap<String, String>, status: &str) -> serde_json::Value {
    json!({
        "orderId": 42,
        "symbol": params.get("symbol").cloned().unwrap_or_default(),
        "status": status,
        "clientOrderId": "mock-1",
        "price": params.get("price").cloned().unwrap_or_else(|| "0".into()),
        "avgPrice": "0.00",
        "origQty": params.get("quantity").cloned().unwrap_or_else(|| "0.010".into()),
        "executedQty": "0",
        "cumQuote": "0",
        "timeInForce": params.get("timeInForce").cloned().unwrap_or_else(|| "GTC".into()),
        "type": params.get("type").cloned().unwrap_or_else(|| "LIMIT".into()),
        "reduceOnly": false,
        "side": params.get("side").cloned().unwrap_or_else(|| "BUY".into()),
        "stopPrice": params.get("stopPrice").cloned().unwrap_or_else(|| "0".into()),
        "updateTime": 1718000000000i64
    })
}

async fn balance(
    State(rec): State<Recorder>,
    headers: HeaderMap,
    RawQuery(q): RawQuery,
) -> Response {
    match authenticate(&rec, &headers, q) {
        Ok(_) => Json(json!([
            {"accountAlias":"A","asset":"USDT","balance":"15000.00","crossWalletBalance":"15000.00",
             "crossUnPnl":"0","availableBalance":"14000.00","maxWithdrawAmount":"14000.00",
             "marginAvailable":true,"updateTime":0},
            {"accountAlias":"A","asset":"BTC","balance":"0.00","crossWalletBalance":"0",
             "crossUnPnl":"0","availableBalance":"0","maxWithdrawAmount":"0",
             "marginAvailable":true,"updateTime":0}
        ]))
        .into_response(),
        Err(resp) => resp,
    }
}

async fn new_order(
    State(rec): State<Recorder>,
    headers: HeaderMap,
    RawQuery(q): RawQuery,
) -> Response {
    match authenticate(&rec, &headers, q) {
        Ok(params) => {
            let status = if params.get("type").map(String::as_str) == Some("MARKET") {
                "FILLED"
            } else {
                "NEW"
            };
            Json(order_json(&params, status)).into_response()
        }
        Err(resp) => resp,
    }
}

async fn query_order(
    State(rec): State<Recorder>,
    headers: HeaderMap,
    RawQuery(q): RawQuery,
) -> Response {
    match authenticate(&rec, &headers, q) {
        Ok(params) if params.get("orderId").map(String::as_str) == Some("42") => {
            Json(order_json(&params, "NEW")).into_response()
        }
        Ok(_) => rejected(-2013, "Order does not exist."),
        Err(resp) => resp,
    }
}

async fn cancel_order(
    State(rec): State<Recorder>,
    headers: HeaderMap,
    RawQuery(q): RawQuery,
) -> Response {
    match authenticate(&rec, &headers, q) {
        Ok(params) if params.get("orderId").map(String::as_str) == Some("42") => {
            Json(order_json(&params, "CANCELED")).into_response()
        }
        Ok(_) => rejected(-2011, "Unknown order sent."),
        Err(resp) => resp,
    }
}

async fn spawn(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

async fn mock_exchange() -> (BinanceFuturesClient, Recorder) {
    let recorder = Recorder::default();
    let router = Router::new()
        .route("/fapi/v1/ping", get(|| async { Json(json!({})) }))
        .route("/fapi/v2/balance", get(balance))
        .route(
            "/fapi/v1/order",
            get(query_order).post(new_order).delete(cancel_order),
        )
        .with_state(recorder.clone());
    let base = spawn(router).await;
    let client =
        BinanceFuturesClient::new(BinanceConfig::testnet(KEY, SECRET).with_base_url(base)).unwrap();
    (client, recorder)
}

fn btc() -> Symbol {
    "BTCUSDT".parse().unwrap()
}

#[tokio::test]
async fn test_ping_and_balances() {
    let (client, _) = mock_exchange().await;
    client.ping().await.unwrap();

    let balances = client.account_balances().await.unwrap();
    assert_eq!(balances.len(), 2);
    assert_eq!(balances[0].asset, "USDT");
    assert_eq!(balances[0].available_balance, dec!(14000));
    assert!(!balances[1].has_funds());
}

#[tokio::test]
async fn test_market_order_is_signed_and_decoded() {
    let (client, recorder) = mock_exchange().await;
    let order = client
        .place_order(&OrderRequest::market(btc(), Side::Buy, dec!(0.010)))
        .await
        .unwrap();
    assert_eq!(order.order_id, 42);
    assert_eq!(order.status, OrderStatus::Filled);

    let sent = recorder.last();
    assert_eq!(sent["type"], "MARKET");
    assert_eq!(sent["quantity"], "0.01");
    assert_eq!(sent["recvWindow"], "5000");
    assert!(sent.contains_key("timestamp"));
    assert!(!sent.contains_key("timeInForce"));
}

#[tokio::test]
async fn test_stop_limit_sent_as_stop() {
    let (client, recorder) = mock_exchange().await;
    let order = client
        .place_order(&OrderRequest::stop_limit(
            btc(),
            Side::Sell,
            dec!(0.01),
            dec!(59000),
            dec!(59500),
        ))
        .await
        .unwrap();
    assert_eq!(order.order_type, OrderType::Stop);
    assert_eq!(order.stop_price, dec!(59500));

    let sent = recorder.last();
    assert_eq!(sent["type"], "STOP");
    assert_eq!(sent["price"], "59000");
    assert_eq!(sent["stopPrice"], "59500");
    assert_eq!(sent["timeInForce"], "GTC");
}

#[tokio::test]
async fn test_status_and_cancel() {
    let (client, _) = mock_exchange().await;
    let status = client.order_status(&btc(), OrderId(42)).await.unwrap();
    assert_eq!(status.status, OrderStatus::New);

    let cancelled = client.cancel_order(&btc(), OrderId(42)).await.unwrap();
    assert_eq!(cancelled.status, OrderStatus::Canceled);
}

#[tokio::test]
async fn test_unknown_order_maps_to_api_error() {
    let (client, _) = mock_exchange().await;
    let err = client.order_status(&btc(), OrderId(7)).await.unwrap_err();
    assert_eq!(
        err,
        ExchangeError::Api {
            status: 400,
            code: -2013,
            msg: "Order does not exist.".to_string()
        }
    );

    let err = client.cancel_order(&btc(), OrderId(7)).await.unwrap_err();
    assert!(err.is_unknown_order());
}

#[tokio::test]
async fn test_wrong_secret_is_rejected() {
    let (good, _) = mock_exchange().await;
    let config = BinanceConfig::testnet(KEY, "not-the-secret")
        .with_base_url(good.config().base_url.clone());
    let client = BinanceFuturesClient::new(config).unwrap();
    let err = client.account_balances().await.unwrap_err();
    assert_eq!(err.code(), Some(-1022));
}

#[tokio::test]
async fn test_non_json_failure_maps_to_http_error() {
    let router =
        Router::new().fallback(|| async { (StatusCode::BAD_GATEWAY, "upstream unavailable") });
    let base = spawn(router).await;
    let client =
        BinanceFuturesClient::new(BinanceConfig::testnet(KEY, SECRET).with_base_url(base)).unwrap();
    let err = client.ping().await.unwrap_err();
    assert!(matches!(err, ExchangeError::Http { status: 502, .. }));
}

#[tokio::test]
async fn test_unreachable_host_is_transport_error() {
    let config = BinanceConfig::testnet(KEY, SECRET).with_base_url("http://127.0.0.1:9");
    let client = BinanceFuturesClient::new(config).unwrap();
    let err = client.ping().await.unwrap_err();
    assert!(matches!(err, ExchangeError::Transport(_)));
}
