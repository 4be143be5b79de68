//! Interactive console menu.

use anyhow::Result;
use dialoguer::{theme::ColorfulTheme, Input, Password};
use futbot_core::*;
use futbot_engine::TradingBot;
use rust_decimal::Decimal;
use std::str::FromStr;

use crate::report;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    Exit,
    Market,
    Limit,
    StopLimit,
    Status,
    Cancel,
    Balance,
}

const MENU: &str = "\n--- Binance Futures Trading Bot ---
1. Place Market Order
2. Place Limit Order
3. Place Stop-Limit Order
4. Check Order Status
5. Cancel Order
6. View Account Balance
0. Exit
---------------------------------";

pub fn parse_choice(raw: &str) -> Result<MenuChoice, String> {
    match raw.trim() {
        "0" => Ok(MenuChoice::Exit),
        "1" => Ok(MenuChoice::Market),
        "2" => Ok(MenuChoice::Limit),
        "3" => Ok(MenuChoice::StopLimit),
        "4" => Ok(MenuChoice::Status),
        "5" => Ok(MenuChoice::Cancel),
        "6" => Ok(MenuChoice::Balance),
        _ => Err("Invalid choice. Please enter a number from 0 to 6.".to_string()),
    }
}

pub fn parse_symbol(raw: &str) -> Result<Symbol, String> {
    Symbol::from_str(raw).map_err(|e| e.to_string())
}

pub fn parse_side(raw: &str) -> Result<Side, String> {
    Side::from_str(raw).map_err(|_| "Please enter BUY or SELL.".to_string())
}

pub fn parse_positive(raw: &str) -> Result<Decimal, String> {
    match Decimal::from_str(raw.trim()) {
        Ok(value) if value > Decimal::ZERO => Ok(value),
        Ok(_) => Err("Value must be greater than zero.".to_string()),
        Err(_) => Err("Invalid input type. Please enter a number.".to_string()),
    }
}

pub fn parse_order_id(raw: &str) -> Result<OrderId, String> {
    OrderId::from_str(raw).map_err(|e| e.to_string())
}

/// Prompt until `parse` accepts the answer.
fn ask<T>(
    theme: &ColorfulTheme,
    prompt: &str,
    parse: impl Fn(&str) -> Result<T, String>,
) -> Result<T> {
    loop {
        let raw: String = Input::with_theme(theme)
            .with_prompt(prompt)
            .allow_empty(true)
            .interact_text()?;
        match parse(&raw) {
            Ok(value) => return Ok(value),
            Err(message) => println!("{message}"),
        }
    }
}

/// Ask for credentials that were not supplied by flags or the environment.
pub fn prompt_credentials() -> Result<Option<(String, String)>> {
    let theme = ColorfulTheme::default();
    println!("API keys not found in environment variables.");
    println!("Please enter your Binance Futures API credentials.");
    let key: String = Input::with_theme(&theme)
        .with_prompt("API Key")
        .allow_empty(true)
        .interact_text()?;
    let secret = Password::with_theme(&theme)
        .with_prompt("Secret Key")
        .allow_empty_password(true)
        .interact()?;

    let (key, secret) = (key.trim().to_string(), secret.trim().to_string());
    if key.is_empty() || secret.is_empty() {
        return Ok(None);
    }
    Ok(Some((key, secret)))
}

/// Run the menu until the user chooses exit.
pub async fn run(bot: &TradingBot) -> Result<()> {
    let theme = ColorfulTheme::default();

    loop {
        println!("{MENU}");
        let choice = ask(&theme, "Enter your choice", parse_choice)?;
        if choice == MenuChoice::Exit {
            println!("Exiting bot. Goodbye!");
            return Ok(());
        }
        run_choice(bot, &theme, choice).await?;

        let _: String = Input::with_theme(&theme)
            .with_prompt("Press Enter to continue...")
            .allow_empty(true)
            .interact_text()?;
    }
}

async fn run_choice(bot: &TradingBot, theme: &ColorfulTheme, choice: MenuChoice) -> Result<()> {
    let symbol_prompt = "Enter symbol (e.g., BTCUSDT)";
    match choice {
        MenuChoice::Market => {
            let symbol = ask(theme, symbol_prompt, parse_symbol)?;
            let side = ask(theme, "Enter side (BUY/SELL)", parse_side)?;
            let quantity = ask(theme, "Enter quantity", parse_positive)?;
            show(bot.place_market_order(symbol, side, quantity).await, "Market order placed");
        }
        MenuChoice::Limit => {
            let symbol = ask(theme, symbol_prompt, parse_symbol)?;
            let side = ask(theme, "Enter side (BUY/SELL)", parse_side)?;
            let quantity = ask(theme, "Enter quantity", parse_positive)?;
            let price = ask(theme, "Enter limit price", parse_positive)?;
            show(
                bot.place_limit_order(symbol, side, quantity, price).await,
                "Limit order placed",
            );
        }
        MenuChoice::StopLimit => {
            let symbol = ask(theme, symbol_prompt, parse_symbol)?;
            let side = ask(theme, "Enter side (BUY/SELL)", parse_side)?;
            let quantity = ask(theme, "Enter quantity", parse_positive)?;
            let stop_price = ask(theme, "Enter stop price (trigger price)", parse_positive)?;
            let price = ask(
                theme,
                "Enter limit price (for when stop is triggered)",
                parse_positive,
            )?;
            show(
                bot.place_stop_limit_order(symbol, side, quantity, price, stop_price)
                    .await,
                "Stop-Limit order placed",
            );
        }
        MenuChoice::Status => {
            let symbol = ask(theme, symbol_prompt, parse_symbol)?;
            let order_id = ask(theme, "Enter Order ID", parse_order_id)?;
            show(bot.order_status(&symbol, order_id).await, "Order Status");
        }
        MenuChoice::Cancel => {
            let symbol = ask(theme, symbol_prompt, parse_symbol)?;
            let order_id = ask(theme, "Enter Order ID to cancel", parse_order_id)?;
            show(
                bot.cancel_order(&symbol, order_id).await,
                "Order cancellation response",
            );
        }
        MenuChoice::Balance => match bot.account_balances().await {
            Ok(balances) => report::print_balances("Account Balance", &balances),
            Err(e) => println!("Error: Could not fetch account balance: {e}"),
        },
        MenuChoice::Exit => {}
    }
    Ok(())
}

fn show<E: std::fmt::Display>(result: Result<ExchangeOrder, E>, heading: &str) {
    match result {
        Ok(order) => report::print_order(heading, &order),
        Err(e) => println!("Error: {e}"),
    }
}
