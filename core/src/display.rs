//! Output formatting for wallets, feed pages and token summaries.
//!
//! Quantities are shown at the token's own precision; quote amounts are in
//! SOL with two decimals and thousands separators.

use chrono::{DateTime, Utc};
use num_format::{Locale, ToFormattedString};
use serde_json::{json, Value};

use crate::aggregate::TokenSlot;
use crate::feed::PageState;
use crate::types::{Transaction, TxType, Wallet};

/// Quote currency every transaction amount is denominated in.
pub const QUOTE_SYMBOL: &str = "SOL";

/// Upper bound on the precision used for token quantities.
pub const MAX_DISPLAY_DECIMALS: u32 = 18;

/// Examples: (1.5, 6) -> "1.500000", (2.0, 0) -> "2"
#[must_use]
pub fn format_quantity(quantity: f64, decimals: u32) -> String {
    format!("{quantity:.*}", decimals.min(MAX_DISPLAY_DECIMALS) as usize)
}

/// Examples: 1890.456 -> "1,890.46", -0.5 -> "-0.50"
#[must_use]
pub fn format_amount(amount: f64) -> String {
    let cents = (amount.abs() * 100.0).round() as u64;
    let sign = if amount < 0.0 && cents > 0 { "-" } else { "" };
    format!(
        "{sign}{}.{:02}",
        (cents / 100).to_formatted_string(&Locale::en),
        cents % 100
    )
}

#[must_use]
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M:%S").to_string()
}

fn side_label(tx_type: TxType) -> &'static str {
    match tx_type {
        TxType::Buy => "BUY ",
        TxType::Sell => "SELL",
    }
}

/// What the wallet paid or received in the quote currency.
fn quote_verb(tx_type: TxType) -> &'static str {
    match tx_type {
        TxType::Buy => "spent",
        TxType::Sell => "received",
    }
}

#[must_use]
pub fn format_wallets(wallets: &[Wallet]) -> String {
    if wallets.is_empty() {
        return "No wallets tracked.".to_string();
    }
    wallets
        .iter()
        .enumerate()
        .map(|(i, w)| {
            let note = if w.note.is_empty() {
                String::new()
            } else {
                format!("  ({})", w.note)
            };
            format!("{:>3}. [{}] {}  {}{note}", i + 1, w.id, w.name, w.address)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[must_use]
pub fn format_transaction(tx: &Transaction) -> String {
    format!(
        "{}  {}  {} {}  {} {} {QUOTE_SYMBOL}  {}  {}",
        format_timestamp(&tx.timestamp),
        side_label(tx.tx_type),
        format_quantity(tx.quantity, tx.token.decimals),
        tx.token.symbol,
        quote_verb(tx.tx_type),
        format_amount(tx.amount),
        tx.wallet.name,
        tx.tx_hash,
    )
}

/// Feed page with a one-based page footer.
#[must_use]
pub fn format_page(state: &PageState) -> String {
    let mut lines: Vec<String> = state.items.iter().map(format_transaction).collect();
    if lines.is_empty() {
        lines.push("No transactions found.".to_string());
    }
    let pages = state.total_pages.max(1);
    lines.push(format!(
        "\nPage {}/{pages}  ({} transactions, {} per page)",
        state.page + 1,
        state.total,
        state.page_size
    ));
    if let Some(err) = &state.error {
        lines.push(format!("Last refresh failed: {err}"));
    }
    lines.join("\n")
}

#[must_use]
pub fn format_token_summary(title: &str, slots: &[TokenSlot]) -> String {
    let mut lines = vec![title.to_string()];
    for slot in slots {
        match slot.group() {
            Some(group) => {
                let wallets = group.wallet_count();
                let noun = if wallets == 1 { "wallet" } else { "wallets" };
                lines.push(format!("  {:<12} {wallets} {noun}", group.token.symbol));
            }
            None => lines.push("  -".to_string()),
        }
    }
    lines.join("\n")
}

/// Detail view of one token's transactions.
#[must_use]
pub fn format_token_transactions(symbol: &str, txs: &[Transaction]) -> String {
    if txs.is_empty() {
        return format!("No {symbol} transactions on this page.");
    }
    let mut lines = vec![format!("{symbol} transactions")];
    for tx in txs {
        lines.push(format!(
            "  {}  {}  {}\n    {} {} {QUOTE_SYMBOL}, {} {} {}",
            format_timestamp(&tx.timestamp),
            tx.wallet.name,
            tx.wallet.address,
            quote_verb(tx.tx_type),
            format_amount(tx.amount),
            match tx.tx_type {
                TxType::Buy => "got",
                TxType::Sell => "sold",
            },
            format_quantity(tx.quantity, tx.token.decimals),
            tx.token.symbol,
        ));
    }
    lines.join("\n")
}

/// JSON form of a summary card; empty slots are `null`.
#[must_use]
pub fn token_summary_json(slots: &[TokenSlot]) -> Value {
    Value::Array(
        slots
            .iter()
            .map(|slot| match slot.group() {
                Some(group) => json!({
                    "symbol": group.token.symbol,
                    "decimals": group.token.decimals,
                    "wallets": group.wallet_ids,
                    "transactions": group.transactions,
                }),
                None => Value::Null,
            })
            .collect(),
    )
}

#[must_use]
pub fn page_json(state: &PageState) -> Value {
    json!({
        "page": state.page,
        "page_size": state.page_size,
        "total": state.total,
        "total_pages": state.total_pages,
        "items": state.items,
        "error": state.error,
    })
}
