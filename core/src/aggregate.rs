//! Token-level views over a page of transactions: recent buys/sells, per-token
//! groups and the fixed-size summary cards built from them.
//!
//! Everything here is a pure function of its input; no state survives between
//! calls, so it is safe to run on every poll.

use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Utc};

use crate::types::{RecordId, Token, Transaction, TxType};

/// Number of slots in a token summary card.
pub const SUMMARY_SLOTS: usize = 5;

/// Transactions fed into a summary card before grouping.
pub const RECENT_LIMIT: usize = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct TokenGroup {
    pub token: Token,
    /// In the order they were encountered.
    pub transactions: Vec<Transaction>,
    pub wallet_ids: BTreeSet<RecordId>,
}

impl TokenGroup {
    fn new(first: &Transaction) -> Self {
        Self {
            token: first.token.clone(),
            transactions: Vec::new(),
            wallet_ids: BTreeSet::new(),
        }
    }

    fn push(&mut self, tx: &Transaction) {
        self.wallet_ids.insert(tx.wallet.id.clone());
        self.transactions.push(tx.clone());
    }

    pub fn wallet_count(&self) -> usize {
        self.wallet_ids.len()
    }

    /// Timestamp the group is ranked by: that of its first transaction.
    pub fn rank_timestamp(&self) -> Option<DateTime<Utc>> {
        self.transactions.first().map(|tx| tx.timestamp)
    }
}

/// A summary card position: a real group or an explicit empty placeholder.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenSlot {
    Group(TokenGroup),
    Empty,
}

impl TokenSlot {
    pub fn group(&self) -> Option<&TokenGroup> {
        match self {
            Self::Group(g) => Some(g),
            Self::Empty => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }
}

/// The `limit` most recent transactions of one type, newest first. Equal
/// timestamps keep their input order.
pub fn recent_transactions(
    transactions: &[Transaction],
    tx_type: TxType,
    limit: usize,
) -> Vec<Transaction> {
    let mut matching: Vec<&Transaction> = transactions
        .iter()
        .filter(|tx| tx.tx_type == tx_type)
        .collect();
    // sort_by is stable
    matching.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    matching.into_iter().take(limit).cloned().collect()
}

/// Group by token symbol and return exactly `SUMMARY_SLOTS` slots: the most
/// recent groups first, then `Empty` padding.
pub fn group_by_token(transactions: &[Transaction]) -> Vec<TokenSlot> {
    let mut groups: Vec<TokenGroup> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for tx in transactions {
        let slot = *index.entry(tx.token.symbol.as_str()).or_insert_with(|| {
            groups.push(TokenGroup::new(tx));
            groups.len() - 1
        });
        groups[slot].push(tx);
    }

    groups.sort_by(|a, b| b.rank_timestamp().cmp(&a.rank_timestamp()));

    let mut slots: Vec<TokenSlot> = groups
        .into_iter()
        .take(SUMMARY_SLOTS)
        .map(TokenSlot::Group)
        .collect();
    slots.resize(SUMMARY_SLOTS, TokenSlot::Empty);
    slots
}

/// "Recent buys" / "recent sells" card.
pub fn token_summary(transactions: &[Transaction], tx_type: TxType) -> Vec<TokenSlot> {
    group_by_token(&recent_transactions(transactions, tx_type, RECENT_LIMIT))
}

/// Every transaction for one token symbol, in input order.
pub fn transactions_for_token(transactions: &[Transaction], symbol: &str) -> Vec<Transaction> {
    transactions
        .iter()
        .filter(|tx| tx.token.symbol == symbol)
        .cloned()
        .collect()
}
