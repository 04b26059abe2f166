//! In-memory transport and fixtures for unit tests.

use std::collections::VecDeque;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use parking_lot::Mutex;
use serde_json::{json, Value};
use tokio::sync::oneshot;

use crate::error::{MonitorError, Result};
use crate::transport::{ApiRequest, Transport};
use crate::types::{RecordId, Token, Transaction, TxType, Wallet};

enum Reply {
    Ready(Result<Value>),
    Gated(oneshot::Receiver<Result<Value>>),
}

/// Answers requests in FIFO order from a scripted queue and records every
/// request it receives.
#[derive(Default)]
pub(crate) struct FakeTransport {
    requests: Mutex<Vec<ApiRequest>>,
    replies: Mutex<VecDeque<Reply>>,
}

impl FakeTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn reply(&self, body: Value) {
        self.replies.lock().push_back(Reply::Ready(Ok(body)));
    }

    pub(crate) fn fail(&self, err: MonitorError) {
        self.replies.lock().push_back(Reply::Ready(Err(err)));
    }

    /// Queue a reply that is only delivered once the returned sender fires.
    pub(crate) fn gate(&self) -> oneshot::Sender<Result<Value>> {
        let (tx, rx) = oneshot::channel();
        self.replies.lock().push_back(Reply::Gated(rx));
        tx
    }

    pub(crate) fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().clone()
    }

    pub(crate) fn request_count(&self) -> usize {
        self.requests.lock().len()
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn send(&self, request: ApiRequest) -> Result<Value> {
        self.requests.lock().push(request);
        let reply = self.replies.lock().pop_front();
        match reply {
            Some(Reply::Ready(result)) => result,
            Some(Reply::Gated(rx)) => rx
                .await
                .unwrap_or_else(|_| Err(MonitorError::transport(None, "gate dropped"))),
            None => Err(MonitorError::transport(None, "no scripted reply")),
        }
    }
}

pub(crate) fn wallet(id: u64, name: &str, address: &str) -> Wallet {
    Wallet {
        id: RecordId::from(id),
        name: name.to_string(),
        address: address.to_string(),
        note: String::new(),
    }
}

pub(crate) fn wallet_json(id: u64, name: &str, address: &str, note: &str) -> Value {
    json!({"id": id, "name": name, "address": address, "note": note})
}

/// Transaction at `minute` minutes past a fixed epoch.
pub(crate) fn tx(id: u64, wallet_id: u64, symbol: &str, tx_type: TxType, minute: i64) -> Transaction {
    let base = Utc.with_ymd_and_hms(2024, 3, 19, 12, 0, 0).unwrap();
    Transaction {
        id: RecordId::from(id),
        wallet: wallet(wallet_id, &format!("w{wallet_id}"), &format!("Addr{wallet_id}")),
        token: Token {
            symbol: symbol.to_string(),
            decimals: 6,
        },
        tx_type,
        quantity: 1.5,
        amount: 0.25,
        timestamp: base + chrono::Duration::minutes(minute),
        tx_hash: format!("hash{id}"),
    }
}

pub(crate) fn page_json(items: &[Transaction], total: u64, total_pages: u64) -> Value {
    json!({
        "items": items,
        "total": total,
        "page": 1,
        "size": items.len(),
        "total_pages": total_pages,
    })
}
