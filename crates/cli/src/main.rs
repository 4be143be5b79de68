mod config;
mod logging;
mod menu;
mod report;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use futbot_brokers_binance::BinanceFuturesClient;
use futbot_brokers_common::PaperExchange;
use futbot_core::*;
use futbot_engine::TradingBot;
use futbot_risk::OrderGuard;
use futbot_web::{cookie_key, AppState};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::config::AppConfig;

#[derive(Parser)]
#[command(name = "futbot")]
#[command(about = "Place, inspect and cancel futures orders from a menu or a web form")]
#[command(version)]
struct Cli {
    /// Log level (trace, debug, info, warn, error); defaults to the config file's value
    #[arg(short, long)]
    log_level: Option<String>,

    /// Config file (defaults to ./futbot.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Trade against an in-memory paper exchange instead of Binance
    #[arg(long)]
    paper: bool,

    /// Use the production futures API instead of the testnet
    #[arg(long, conflicts_with = "paper")]
    mainnet: bool,

    #[arg(long, env = "BINANCE_TEST_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    #[arg(long, env = "BINANCE_TEST_API_SECRET", hide_env_values = true)]
    api_secret: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive menu (the default)
    Menu,

    /// Place a market order
    Market {
        #[arg(short, long)]
        symbol: Symbol,
        #[arg(long)]
        side: Side,
        #[arg(short, long)]
        quantity: Decimal,
    },

    /// Place a GTC limit order
    Limit {
        #[arg(short, long)]
        symbol: Symbol,
        #[arg(long)]
        side: Side,
        #[arg(short, long)]
        quantity: Decimal,
        #[arg(short, long)]
        price: Decimal,
    },

    /// Place a stop-limit order: a limit at --price once --stop-price trades
    StopLimit {
        #[arg(short, long)]
        symbol: Symbol,
        #[arg(long)]
        side: Side,
        #[arg(short, long)]
        quantity: Decimal,
        #[arg(short, long)]
        price: Decimal,
        #[arg(long)]
        stop_price: Decimal,
    },

    /// Show an order's status
    Status {
        #[arg(short, long)]
        symbol: Symbol,
        #[arg(short, long)]
        order_id: OrderId,
    },

    /// Cancel a working order
    Cancel {
        #[arg(short, long)]
        symbol: Symbol,
        #[arg(short, long)]
        order_id: OrderId,
    },

    /// List assets with a positive balance
    Balance,

    /// Start the web front-end
    Serve {
        /// Bind address (defaults to the config file's [web] bind)
        #[arg(short, long)]
        bind: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Before parsing so .env values reach clap's env fallbacks.
    let _ = dotenvy::dotenv();
    let mut cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref())?;

    let level = cli
        .log_level
        .clone()
        .unwrap_or_else(|| config.logging.level.clone());
    let _log_guard = logging::init(&level, &config.logging.file)?;

    match cli.command.take().unwrap_or(Commands::Menu) {
        Commands::Menu => {
            let credentials = match credentials(&cli) {
                None if !cli.paper => menu::prompt_credentials()?,
                found => found,
            };
            if credentials.is_none() && !cli.paper {
                println!("API Key and Secret Key are required. Exiting.");
                return Err(anyhow!("missing API credentials"));
            }
            let bot = match open_bot(&cli, &config, credentials).await {
                Ok(bot) => bot,
                Err(e) => {
                    println!(
                        "Critical error: Failed to initialize the bot. Check logs. Error: {e}"
                    );
                    return Err(e);
                }
            };
            menu::run(&bot).await?;
        }
        Commands::Serve { bind } => {
            let bind = bind.unwrap_or_else(|| config.web.bind.clone());
            let bot = if cli.paper || credentials(&cli).is_some() {
                match open_bot(&cli, &config, credentials(&cli)).await {
                    Ok(bot) => Some(Arc::new(bot)),
                    Err(e) => {
                        error!(error = %e, "Bot initialization failed; serving without a bot");
                        None
                    }
                }
            } else {
                warn!(
                    "BINANCE_TEST_API_KEY or BINANCE_TEST_API_SECRET not set; serving without a bot"
                );
                None
            };
            let secret = std::env::var("FUTBOT_SECRET_KEY").ok();
            let state = AppState::new(bot, cookie_key(secret.as_deref()), network(&cli, &config));
            futbot_web::start_server(state, &bind).await?;
        }
        command => {
            let bot = open_bot(&cli, &config, credentials(&cli)).await?;
            run_command(&bot, command).await?;
        }
    }

    Ok(())
}

/// Key and secret from flags or the environment, if both are non-empty.
fn credentials(cli: &Cli) -> Option<(String, String)> {
    let key = cli.api_key.as_deref().map(str::trim).filter(|k| !k.is_empty())?;
    let secret = cli.api_secret.as_deref().map(str::trim).filter(|s| !s.is_empty())?;
    Some((key.to_string(), secret.to_string()))
}

fn network(cli: &Cli, config: &AppConfig) -> String {
    if cli.paper {
        "paper"
    } else if cli.mainnet || !config.exchange.testnet {
        "mainnet"
    } else {
        "testnet"
    }
    .to_string()
}

/// Build the exchange for the selected network and connect the bot to it.
async fn open_bot(
    cli: &Cli,
    config: &AppConfig,
    credentials: Option<(String, String)>,
) -> Result<TradingBot> {
    let exchange: Arc<dyn FuturesExchange> = if cli.paper {
        let mut paper = config.paper.clone();
        if paper.balances.is_empty() {
            paper = paper.with_balance("USDT", dec!(10000));
        }
        Arc::new(PaperExchange::new(paper))
    } else {
        let (key, secret) = credentials.ok_or_else(|| {
            anyhow!(
                "API credentials required: set BINANCE_TEST_API_KEY and BINANCE_TEST_API_SECRET \
                 or pass --api-key/--api-secret"
            )
        })?;
        let binance = config.binance(&key, &secret, cli.mainnet);
        if !binance.is_testnet() {
            warn!(base_url = %binance.base_url, "Using a production endpoint; orders are real");
        }
        Arc::new(BinanceFuturesClient::new(binance)?)
    };

    info!(network = %network(cli, config), limits = %config.risk.name, "Initializing bot");
    let bot = TradingBot::connect(exchange, OrderGuard::new(config.risk.clone())).await?;
    Ok(bot)
}

async fn run_command(bot: &TradingBot, command: Commands) -> Result<()> {
    match command {
        Commands::Market {
            symbol,
            side,
            quantity,
        } => {
            let order = bot.place_market_order(symbol, side, quantity).await?;
            report::print_order("Market order placed", &order);
        }
        Commands::Limit {
            symbol,
            side,
            quantity,
            price,
        } => {
            let order = bot.place_limit_order(symbol, side, quantity, price).await?;
            report::print_order("Limit order placed", &order);
        }
        Commands::StopLimit {
            symbol,
            side,
            quantity,
            price,
            stop_price,
        } => {
            let order = bot
                .place_stop_limit_order(symbol, side, quantity, price, stop_price)
                .await?;
            report::print_order("Stop-Limit order placed", &order);
        }
        Commands::Status { symbol, order_id } => {
            let order = bot.order_status(&symbol, order_id).await?;
            report::print_order("Order Status", &order);
        }
        Commands::Cancel { symbol, order_id } => {
            let order = bot.cancel_order(&symbol, order_id).await?;
            report::print_order("Order cancellation response", &order);
        }
        Commands::Balance => {
            let balances = bot.account_balances().await?;
            report::print_balances("Account Balance", &balances);
        }
        Commands::Menu | Commands::Serve { .. } => {}
    }
    Ok(())
}
