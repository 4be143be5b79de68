use crate::flash::Flash;
use futbot_core::AssetBalance;
use std::fmt::Write;

const INDEX_TEMPLATE: &str = include_str!("../templates/index.html");

/// What the dashboard shows in its balance panel.
pub enum BalancePanel<'a> {
    /// No bot: credentials missing or startup failed.
    Unavailable,
    /// The fetch failed; the error is already in the flash list.
    Failed,
    Loaded(&'a [AssetBalance]),
}

/// Escape text for HTML element and attribute content.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn flashes_html(flashes: &[Flash]) -> String {
    let mut html = String::new();
    for flash in flashes {
        let _ = writeln!(
            html,
            r#"<div class="flash {}">{}</div>"#,
            flash.level.as_str(),
            escape_html(&flash.message)
        );
    }
    html
}

fn balances_html(panel: BalancePanel<'_>) -> String {
    match panel {
        BalancePanel::Unavailable => {
            r#"<p class="muted">Bot not initialized. API keys may be missing or invalid.</p>"#
                .to_string()
        }
        BalancePanel::Failed => r#"<p class="muted">Balance unavailable.</p>"#.to_string(),
        BalancePanel::Loaded([]) => {
            r#"<p class="muted">No assets with a positive balance.</p>"#.to_string()
        }
        BalancePanel::Loaded(balances) => {
            let mut html = String::from(
                "<table>\n<tr><th>Asset</th><th>Balance</th><th>Available</th></tr>\n",
            );
            for b in balances {
                let _ = writeln!(
                    html,
                    "<tr><td>{}</td><td>{}</td><td>{}</td></tr>",
                    escape_html(&b.asset),
                    b.balance,
                    b.available_balance
                );
            }
            html.push_str("</table>");
            html
        }
    }
}

/// Render the dashboard page.
pub fn index_page(network: &str, flashes: &[Flash], balances: BalancePanel<'_>) -> String {
    INDEX_TEMPLATE
        .replace("{{network}}", &escape_html(network))
        .replace("{{flashes}}", &flashes_html(flashes))
        .replace("{{balances}}", &balances_html(balances))
}
