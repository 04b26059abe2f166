//! Paginated monitoring feed with a stale-response guard.
//!
//! Every page-parameter change issues exactly one fetch. In-flight fetches are
//! never cancelled; instead each fetch captures a request generation and its
//! `(page, page_size)` key, and its result is applied only if both still match
//! when it resolves. The last-issued request therefore always wins, whatever
//! order the responses arrive in.

use std::sync::Arc;

use log::{debug, warn};
use parking_lot::Mutex;

use crate::aggregate::{self, TokenSlot};
use crate::error::{MonitorError, Result};
use crate::notify::{Notification, NotificationBoard};
use crate::transport::MonitorApi;
use crate::types::{Transaction, TxType};

/// Snapshot of the page currently on display. Replaced as a whole, never
/// patched field by field.
#[derive(Debug, Clone, PartialEq)]
pub struct PageState {
    /// Zero-based.
    pub page: u32,
    pub page_size: u32,
    pub items: Vec<Transaction>,
    pub total: u64,
    pub total_pages: u64,
    pub loading: bool,
    pub error: Option<String>,
}

impl PageState {
    fn empty(page_size: u32) -> Self {
        Self {
            page: 0,
            page_size,
            items: Vec::new(),
            total: 0,
            total_pages: 0,
            loading: false,
            error: None,
        }
    }

    pub fn has_next(&self) -> bool {
        u64::from(self.page) + 1 < self.total_pages
    }

    pub fn has_prev(&self) -> bool {
        self.page > 0
    }
}

/// What happened to a fetch once its response arrived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    Applied,
    /// A newer request had been issued; the response was dropped.
    Discarded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PageKey {
    page: u32,
    page_size: u32,
}

struct FeedInner {
    state: PageState,
    target: PageKey,
    generation: u64,
}

/// Clears the loading flag of an abandoned fetch unless a newer one owns it.
struct LoadingGuard<'a> {
    inner: &'a Mutex<FeedInner>,
    generation: u64,
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        let mut inner = self.inner.lock();
        if inner.generation == self.generation && inner.state.loading {
            inner.state = PageState {
                loading: false,
                ..inner.state.clone()
            };
        }
    }
}

pub struct FeedController {
    api: MonitorApi,
    board: Arc<NotificationBoard>,
    inner: Mutex<FeedInner>,
}

impl FeedController {
    pub fn new(api: MonitorApi, board: Arc<NotificationBoard>, page_size: u32) -> Self {
        Self {
            api,
            board,
            inner: Mutex::new(FeedInner {
                state: PageState::empty(page_size),
                target: PageKey { page: 0, page_size },
                generation: 0,
            }),
        }
    }

    pub fn state(&self) -> PageState {
        self.inner.lock().state.clone()
    }

    /// The `(page, page_size)` pair most recently requested, which may not be
    /// on display yet.
    pub fn target(&self) -> (u32, u32) {
        let target = self.inner.lock().target;
        (target.page, target.page_size)
    }

    pub async fn set_page(&self, page: u32) -> Result<FetchOutcome> {
        let page_size = self.inner.lock().target.page_size;
        self.fetch(PageKey { page, page_size }).await
    }

    /// Changing the page size always jumps back to the first page.
    pub async fn set_page_size(&self, page_size: u32) -> Result<FetchOutcome> {
        if page_size == 0 {
            let err = MonitorError::Validation("Page size must be positive.".into());
            self.board
                .post(Notification::failure("Failed to load transactions", &err));
            return Err(err);
        }
        self.fetch(PageKey { page: 0, page_size }).await
    }

    /// Re-fetch the current target page.
    pub async fn refresh(&self) -> Result<FetchOutcome> {
        let target = self.inner.lock().target;
        self.fetch(target).await
    }

    /// Most recent transactions of one type on the displayed page.
    pub fn recent(&self, tx_type: TxType, limit: usize) -> Vec<Transaction> {
        aggregate::recent_transactions(&self.inner.lock().state.items, tx_type, limit)
    }

    /// Token summary card for the displayed page.
    pub fn token_summary(&self, tx_type: TxType) -> Vec<TokenSlot> {
        aggregate::token_summary(&self.inner.lock().state.items, tx_type)
    }

    /// Full transaction list for one token on the displayed page.
    pub fn token_transactions(&self, symbol: &str) -> Vec<Transaction> {
        aggregate::transactions_for_token(&self.inner.lock().state.items, symbol)
    }

    async fn fetch(&self, key: PageKey) -> Result<FetchOutcome> {
        let Some(wire_page) = key.page.checked_add(1) else {
            let err = MonitorError::Validation(format!("Page {} is out of range.", key.page));
            self.board
                .post(Notification::failure("Failed to load transactions", &err));
            return Err(err);
        };
        let generation = {
            let mut inner = self.inner.lock();
            inner.generation += 1;
            inner.target = key;
            inner.state = PageState {
                loading: true,
                ..inner.state.clone()
            };
            inner.generation
        };
        debug!(
            "feed fetch #{generation}: page {} size {}",
            key.page, key.page_size
        );

        let _loading = LoadingGuard {
            inner: &self.inner,
            generation,
        };
        let result = self.api.monitoring_page(wire_page, key.page_size).await;

        let mut inner = self.inner.lock();
        if inner.generation != generation || inner.target != key {
            debug!("feed fetch #{generation} superseded by #{}, discarding", inner.generation);
            return Ok(FetchOutcome::Discarded);
        }

        match result {
            Ok(mut body) => {
                let limit = key.page_size as usize;
                if body.items.len() > limit {
                    warn!(
                        "server returned {} items for page size {limit}, truncating",
                        body.items.len()
                    );
                    body.items.truncate(limit);
                }
                inner.state = PageState {
                    page: key.page,
                    page_size: key.page_size,
                    items: body.items,
                    total: body.total,
                    total_pages: body.total_pages,
                    loading: false,
                    error: None,
                };
                Ok(FetchOutcome::Applied)
            }
            Err(err) => {
                warn!("feed fetch #{generation} failed: {err}");
                inner.state = PageState {
                    loading: false,
                    error: Some(err.to_string()),
                    ..inner.state.clone()
                };
                drop(inner);
                self.board
                    .post(Notification::failure("Failed to load transactions", &err));
                Err(err)
            }
        }
    }
}
