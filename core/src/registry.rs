//! Client-side view of the tracked wallet collection.
//!
//! Nothing is optimistic: the local collection only changes after the server
//! has confirmed an operation, and a failed call leaves it exactly as it was.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, warn};
use parking_lot::Mutex;
use tokio::time::Instant;

use crate::error::{MonitorError, Result};
use crate::notify::{Notification, NotificationBoard};
use crate::transport::MonitorApi;
use crate::types::{RecordId, Wallet, WalletDraft};

/// Proof that the operator was asked to confirm a delete. Only the most
/// recently issued token is honoured, and only until it expires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteToken {
    serial: u64,
    wallet_id: RecordId,
}

impl DeleteToken {
    pub fn wallet_id(&self) -> &RecordId {
        &self.wallet_id
    }
}

struct PendingDelete {
    token: DeleteToken,
    issued_at: Instant,
}

#[derive(Default)]
struct RegistryInner {
    wallets: Vec<Wallet>,
    in_flight: usize,
    pending_delete: Option<PendingDelete>,
    next_serial: u64,
}

/// Lowers the loading flag even if the request future is dropped early.
struct InFlight<'a>(&'a Mutex<RegistryInner>);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.lock().in_flight -= 1;
    }
}

pub struct WalletRegistry {
    api: MonitorApi,
    board: Arc<NotificationBoard>,
    confirm_ttl: Duration,
    inner: Mutex<RegistryInner>,
}

impl WalletRegistry {
    pub fn new(api: MonitorApi, board: Arc<NotificationBoard>, confirm_ttl: Duration) -> Self {
        Self {
            api,
            board,
            confirm_ttl,
            inner: Mutex::new(RegistryInner::default()),
        }
    }

    /// The last server-confirmed collection.
    pub fn wallets(&self) -> Vec<Wallet> {
        self.inner.lock().wallets.clone()
    }

    pub fn loading(&self) -> bool {
        self.inner.lock().in_flight > 0
    }

    pub fn get(&self, id: &RecordId) -> Option<Wallet> {
        self.inner
            .lock()
            .wallets
            .iter()
            .find(|w| &w.id == id)
            .cloned()
    }

    /// Exact address match against the loaded collection.
    pub fn find_by_address(&self, address: &str) -> Option<Wallet> {
        let address = address.trim();
        self.inner
            .lock()
            .wallets
            .iter()
            .find(|w| w.address == address)
            .cloned()
    }

    /// Reload the whole collection from the server.
    pub async fn list(&self) -> Result<Vec<Wallet>> {
        let result = self.tracked(self.api.list_wallets()).await;
        match result {
            Ok(wallets) => {
                debug!("loaded {} wallets", wallets.len());
                self.inner.lock().wallets = wallets.clone();
                Ok(wallets)
            }
            Err(err) => Err(self.report("Failed to load wallets", err)),
        }
    }

    /// Create a wallet; the server's canonical record is what gets stored.
    pub async fn create(&self, draft: &WalletDraft) -> Result<Wallet> {
        let result = self.tracked(self.api.create_wallet(draft)).await;
        match result {
            Ok(wallet) => {
                self.inner.lock().wallets.push(wallet.clone());
                self.board.post(Notification::success("Wallet created"));
                Ok(wallet)
            }
            Err(err) => Err(self.report("Failed to create wallet", err)),
        }
    }

    /// Update a wallet. If the id has meanwhile disappeared from the local
    /// collection the confirmed record is returned but not re-added.
    pub async fn update(&self, id: &RecordId, draft: &WalletDraft) -> Result<Wallet> {
        let result = self.tracked(self.api.update_wallet(id, draft)).await;
        match result {
            Ok(wallet) => {
                {
                    let mut inner = self.inner.lock();
                    match inner.wallets.iter_mut().find(|w| &w.id == id) {
                        Some(slot) => *slot = wallet.clone(),
                        None => debug!("updated wallet {id} is no longer listed, ignoring"),
                    }
                }
                self.board.post(Notification::success("Wallet updated"));
                Ok(wallet)
            }
            Err(err) => Err(self.report("Failed to update wallet", err)),
        }
    }

    /// First step of a delete: ask for confirmation. Issuing a new token
    /// abandons any earlier one.
    pub fn request_delete(&self, id: &RecordId) -> DeleteToken {
        let mut inner = self.inner.lock();
        inner.next_serial += 1;
        let token = DeleteToken {
            serial: inner.next_serial,
            wallet_id: id.clone(),
        };
        inner.pending_delete = Some(PendingDelete {
            token: token.clone(),
            issued_at: Instant::now(),
        });
        token
    }

    /// Abandon a pending delete. Returns whether the token was still pending.
    pub fn cancel_delete(&self, token: &DeleteToken) -> bool {
        let mut inner = self.inner.lock();
        let pending = inner
            .pending_delete
            .as_ref()
            .is_some_and(|p| &p.token == token);
        if pending {
            inner.pending_delete = None;
        }
        pending
    }

    /// Second step of a delete: issue the request, then drop the wallet
    /// locally once the server confirms.
    pub async fn confirm_delete(&self, token: &DeleteToken) -> Result<()> {
        {
            let mut inner = self.inner.lock();
            let valid = matches!(
                &inner.pending_delete,
                Some(p) if &p.token == token && p.issued_at.elapsed() <= self.confirm_ttl
            );
            if !valid {
                return Err(MonitorError::Validation(
                    "Delete confirmation is unknown or has expired.".into(),
                ));
            }
            inner.pending_delete = None;
        }

        let id = token.wallet_id();
        let result = self.tracked(self.api.delete_wallet(id)).await;
        match result {
            Ok(()) => {
                self.inner.lock().wallets.retain(|w| &w.id != id);
                self.board.post(Notification::success("Wallet deleted"));
                Ok(())
            }
            Err(err) => Err(self.report("Failed to delete wallet", err)),
        }
    }

    /// Run a request with this component's loading flag raised.
    async fn tracked<T>(&self, request: impl Future<Output = Result<T>>) -> Result<T> {
        self.inner.lock().in_flight += 1;
        let _in_flight = InFlight(&self.inner);
        request.await
    }

    fn report(&self, scope: &str, err: MonitorError) -> MonitorError {
        warn!("{scope}: {err}");
        self.board.post(Notification::failure(scope, &err));
        err
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::Severity;
    use crate::testing::{wallet, wallet_json, FakeTransport};
    use crate::transport::Method;
    use futures::poll;
    use serde_json::json;
    use std::task::Poll;

    const TTL: Duration = Duration::from_secs(60);

    fn registry(fake: &Arc<FakeTransport>) -> (WalletRegistry, Arc<NotificationBoard>) {
        let board = Arc::new(NotificationBoard::new());
        let api = MonitorApi::new(fake.clone());
        (WalletRegistry::new(api, board.clone(), TTL), board)
    }

    async fn loaded(fake: &Arc<FakeTransport>) -> (WalletRegistry, Arc<NotificationBoard>) {
        let (reg, board) = registry(fake);
        fake.reply(json!([
            wallet_json(1, "main", "AddrA", ""),
            wallet_json(2, "alt", "AddrB", "cold storage"),
        ]));
        reg.list().await.unwrap();
        (reg, board)
    }

    #[tokio::test]
    async fn list_replaces_collection() {
        let fake = Arc::new(FakeTransport::new());
        let (reg, _) = loaded(&fake).await;
        assert_eq!(reg.wallets().len(), 2);

        fake.reply(json!([wallet_json(3, "new", "AddrC", "")]));
        reg.list().await.unwrap();
        assert_eq!(reg.wallets(), vec![wallet(3, "new", "AddrC")]);
        assert_eq!(fake.requests()[1].path, "/wallets/");
    }

    #[tokio::test]
    async fn create_appends_server_record() {
        let fake = Arc::new(FakeTransport::new());
        let (reg, board) = loaded(&fake).await;
        fake.reply(wallet_json(9, "server-name", "AddrZ", ""));

        let draft = WalletDraft::new("draft-name", "AddrZ", "");
        let created = reg.create(&draft).await.unwrap();

        assert_eq!(created.id.as_str(), "9");
        assert_eq!(reg.wallets().last().unwrap().name, "server-name");
        let req = &fake.requests()[1];
        assert_eq!(req.method, Method::Post);
        assert_eq!(
            req.body,
            Some(json!({"name": "draft-name", "address": "AddrZ", "note": ""}))
        );
        assert_eq!(board.current(), Some(Notification::success("Wallet created")));
    }

    #[tokio::test]
    async fn create_rejected_keeps_collection() {
        let fake = Arc::new(FakeTransport::new());
        let (reg, board) = loaded(&fake).await;
        fake.fail(MonitorError::Validation("Address already exists".into()));

        let err = reg
            .create(&WalletDraft::new("dup", "AddrA", ""))
            .await
            .unwrap_err();
        assert!(matches!(err, MonitorError::Validation(_)));
        assert_eq!(reg.wallets().len(), 2);
        let note = board.current().unwrap();
        assert_eq!(note.kind, Severity::Error);
        assert!(note.message.contains("Address already exists"));
    }

    #[tokio::test]
    async fn update_replaces_by_id() {
        let fake = Arc::new(FakeTransport::new());
        let (reg, _) = loaded(&fake).await;
        fake.reply(wallet_json(2, "renamed", "AddrB", "hot"));

        reg.update(&RecordId::from(2), &WalletDraft::new("renamed", "AddrB", "hot"))
            .await
            .unwrap();

        let req = &fake.requests()[1];
        assert_eq!(req.method, Method::Put);
        assert_eq!(req.path, "/wallets/2");
        let updated = reg.get(&RecordId::from(2)).unwrap();
        assert_eq!(updated.name, "renamed");
        assert_eq!(updated.note, "hot");
        assert_eq!(reg.wallets()[0].name, "main");
    }

    #[tokio::test]
    async fn update_of_missing_id_is_silent_noop() {
        let fake = Arc::new(FakeTransport::new());
        let (reg, _) = loaded(&fake).await;
        let before = reg.wallets();
        fake.reply(wallet_json(77, "ghost", "AddrG", ""));

        let result = reg
            .update(&RecordId::from("nonexistent"), &WalletDraft::new("ghost", "AddrG", ""))
            .await;
        assert!(result.is_ok());
        assert_eq!(reg.wallets(), before);
    }

    #[tokio::test]
    async fn update_failure_keeps_collection() {
        let fake = Arc::new(FakeTransport::new());
        let (reg, board) = loaded(&fake).await;
        let before = reg.wallets();
        fake.fail(MonitorError::transport(Some(500), "Request failed (HTTP 500)"));

        assert!(reg
            .update(&RecordId::from(1), &WalletDraft::new("x", "AddrA", ""))
            .await
            .is_err());
        assert_eq!(reg.wallets(), before);
        assert!(board.current().unwrap().message.starts_with("Failed to update wallet"));
    }

    #[tokio::test]
    async fn delete_requires_confirmation() {
        let fake = Arc::new(FakeTransport::new());
        let (reg, _) = loaded(&fake).await;
        let token = reg.request_delete(&RecordId::from(1));
        assert_eq!(fake.request_count(), 1, "requesting never hits the network");

        fake.reply(json!({"message": "deleted"}));
        reg.confirm_delete(&token).await.unwrap();

        let req = &fake.requests()[1];
        assert_eq!(req.method, Method::Delete);
        assert_eq!(req.path, "/wallets/1");
        assert!(reg.get(&RecordId::from(1)).is_none());
        assert_eq!(reg.wallets().len(), 1);
    }

    #[tokio::test]
    async fn confirmation_is_single_use() {
        let fake = Arc::new(FakeTransport::new());
        let (reg, _) = loaded(&fake).await;
        let token = reg.request_delete(&RecordId::from(1));
        fake.reply(serde_json::Value::Null);
        reg.confirm_delete(&token).await.unwrap();

        assert!(reg.confirm_delete(&token).await.is_err());
        assert_eq!(fake.request_count(), 2);
    }

    #[tokio::test]
    async fn cancelled_or_superseded_token_never_deletes() {
        let fake = Arc::new(FakeTransport::new());
        let (reg, _) = loaded(&fake).await;

        let cancelled = reg.request_delete(&RecordId::from(1));
        assert!(reg.cancel_delete(&cancelled));
        assert!(!reg.cancel_delete(&cancelled));
        assert!(reg.confirm_delete(&cancelled).await.is_err());

        let first = reg.request_delete(&RecordId::from(1));
        let _second = reg.request_delete(&RecordId::from(2));
        assert!(reg.confirm_delete(&first).await.is_err());

        assert_eq!(fake.request_count(), 1);
        assert_eq!(reg.wallets().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn expired_token_has_no_effect() {
        let fake = Arc::new(FakeTransport::new());
        let (reg, board) = loaded(&fake).await;
        board.dismiss();
        let token = reg.request_delete(&RecordId::from(2));

        tokio::time::advance(TTL + Duration::from_secs(1)).await;

        assert!(reg.confirm_delete(&token).await.is_err());
        assert_eq!(fake.request_count(), 1);
        assert_eq!(reg.wallets().len(), 2);
        assert!(board.current().is_none());
    }

    #[tokio::test]
    async fn delete_failure_keeps_wallet() {
        let fake = Arc::new(FakeTransport::new());
        let (reg, board) = loaded(&fake).await;
        let token = reg.request_delete(&RecordId::from(2));
        fake.fail(MonitorError::transport(None, "Request timed out after 10s"));

        assert!(reg.confirm_delete(&token).await.is_err());
        assert!(reg.get(&RecordId::from(2)).is_some());
        assert!(board.current().unwrap().is_error());
    }

    #[tokio::test]
    async fn loading_flag_tracks_requests() {
        let fake = Arc::new(FakeTransport::new());
        let (reg, _) = registry(&fake);
        let gate = fake.gate();

        let listing = reg.list();
        tokio::pin!(listing);
        assert!(matches!(poll!(&mut listing), Poll::Pending));
        assert!(reg.loading());

        gate.send(Ok(json!([]))).unwrap();
        listing.await.unwrap();
        assert!(!reg.loading());
    }

    #[tokio::test]
    async fn find_by_address_exact() {
        let fake = Arc::new(FakeTransport::new());
        let (reg, _) = loaded(&fake).await;
        assert_eq!(reg.find_by_address(" AddrB ").unwrap().name, "alt");
        assert!(reg.find_by_address("addrb").is_none());
    }
}
