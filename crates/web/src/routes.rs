use crate::flash::{self, Flash};
use crate::forms::{self, CancelForm, PlaceOrderForm, StatusForm};
use crate::render::{self, BalancePanel};
use crate::state::AppState;
use axum::{
    extract::State,
    response::{Html, IntoResponse, Redirect},
    routing::{get, post},
    Form, Json, Router,
};
use axum_extra::extract::cookie::SignedCookieJar;
use futbot_core::OrderKind;
use futbot_engine::BotError;
use tracing::{info, warn};

const NOT_INITIALIZED: &str = "Bot not initialized. API keys may be missing or invalid.";

pub fn page_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/place_order", post(place_order))
        .route("/check_status", post(check_status))
        .route("/cancel_order", post(cancel_order))
}

pub fn api_routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "network": state.network,
        "bot_ready": state.bot.is_some(),
    }))
}

// ---------------------------------------------------------------------------
// Dashboard
// ---------------------------------------------------------------------------

async fn index(State(state): State<AppState>, jar: SignedCookieJar) -> impl IntoResponse {
    let (jar, mut flashes) = flash::take(jar);

    let balances = match &state.bot {
        Some(bot) => bot.account_balances().await.map_err(|e| {
            flashes.push(Flash::error(format!("Error fetching account balance: {}", e)));
        }),
        None => Ok(Vec::new()),
    };
    let panel = match (&state.bot, &balances) {
        (None, _) => BalancePanel::Unavailable,
        (Some(_), Ok(list)) => BalancePanel::Loaded(list.as_slice()),
        (Some(_), Err(())) => BalancePanel::Failed,
    };

    let page = render::index_page(&state.network, &flashes, panel);
    (jar, Html(page))
}

// ---------------------------------------------------------------------------
// Actions (post/redirect/get)
// ---------------------------------------------------------------------------

fn back(jar: SignedCookieJar, flash: Flash) -> (SignedCookieJar, Redirect) {
    (flash::push(jar, flash), Redirect::to("/"))
}

async fn place_order(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    Form(form): Form<PlaceOrderForm>,
) -> (SignedCookieJar, Redirect) {
    let Some(bot) = state.bot.as_ref() else {
        return back(jar, Flash::error(NOT_INITIALIZED));
    };
    let order = match form.parse() {
        Ok(order) => order,
        Err(message) => return back(jar, Flash::error(message)),
    };

    let result = match order.kind {
        OrderKind::Market => {
            bot.place_market_order(order.symbol.clone(), order.side, order.quantity)
                .await
        }
        OrderKind::Limit { price } => {
            bot.place_limit_order(order.symbol.clone(), order.side, order.quantity, price)
                .await
        }
        OrderKind::StopLimit { price, stop_price } => {
            bot.place_stop_limit_order(
                order.symbol.clone(),
                order.side,
                order.quantity,
                price,
                stop_price,
            )
            .await
        }
    };

    let flash = match result {
        Ok(placed) => {
            info!(order_id = placed.order_id, "Order placed from web form");
            Flash::success(forms::placed_message(&order, &placed))
        }
        Err(BotError::Rejected(reason)) => Flash::error(reason),
        Err(BotError::Exchange(e)) => {
            warn!(error = %e, "Order placement failed");
            Flash::error(forms::failed_message(&order, &e))
        }
    };
    back(jar, flash)
}

async fn check_status(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    Form(form): Form<StatusForm>,
) -> (SignedCookieJar, Redirect) {
    let Some(bot) = state.bot.as_ref() else {
        return back(jar, Flash::error(NOT_INITIALIZED));
    };
    let (symbol, order_id) = match form.parse() {
        Ok(lookup) => lookup,
        Err(message) => return back(jar, Flash::error(message)),
    };

    let flash = match bot.order_status(&symbol, order_id).await {
        Ok(order) => Flash::success(format!(
            "Status for Order ID {} ({}): {}",
            order_id, symbol, order.status
        )),
        Err(e) => Flash::error(format!(
            "Order ID {} ({}) not found or error fetching status: {}",
            order_id, symbol, e
        )),
    };
    back(jar, flash)
}

async fn cancel_order(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    Form(form): Form<CancelForm>,
) -> (SignedCookieJar, Redirect) {
    let Some(bot) = state.bot.as_ref() else {
        return back(jar, Flash::error(NOT_INITIALIZED));
    };
    let (symbol, order_id) = match form.parse() {
        Ok(lookup) => lookup,
        Err(message) => return back(jar, Flash::error(message)),
    };

    let flash = match bot.cancel_order(&symbol, order_id).await {
        Ok(_) => Flash::success(format!(
            "Order ID {} ({}) cancelled successfully.",
            order_id, symbol
        )),
        Err(e) => Flash::error(format!(
            "Order ID {} ({}) not found or error cancelling: {}",
            order_id, symbol, e
        )),
    };
    back(jar, flash)
}
