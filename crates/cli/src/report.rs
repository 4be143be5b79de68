use futbot_core::{AssetBalance, ExchangeOrder};

/// Print an exchange response as indented JSON under a heading.
pub fn print_order(heading: &str, order: &ExchangeOrder) {
    match serde_json::to_string_pretty(order) {
        Ok(json) => println!("{heading}:\n{json}"),
        Err(_) => println!("{heading}: {order:?}"),
    }
    if let Some(line) = updated_line(order) {
        println!("{line}");
    }
}

/// Last exchange update in UTC, when the response carried one.
pub fn updated_line(order: &ExchangeOrder) -> Option<String> {
    order
        .updated_at()
        .map(|at| format!("Last updated: {}", at.format("%Y-%m-%d %H:%M:%S UTC")))
}

pub fn balance_line(balance: &AssetBalance) -> String {
    format!(
        "Asset: {}, Balance: {}, Available: {}",
        balance.asset, balance.balance, balance.available_balance
    )
}

pub fn print_balances(heading: &str, balances: &[AssetBalance]) {
    println!("\n--- {heading} ---");
    if balances.is_empty() {
        println!("No assets with a positive balance.");
    }
    for balance in balances {
        println!("{}", balance_line(balance));
    }
    println!("-----------------------------");
}
