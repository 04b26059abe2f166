use std::sync::Arc;

use crate::config::ClientConfig;
use crate::error::Result;
use crate::feed::FeedController;
use crate::import::BatchImporter;
use crate::notify::{Notification, NotificationBoard};
use crate::registry::WalletRegistry;
use crate::transport::{HttpTransport, MonitorApi, Transport};

/// Wires one transport and one notification board into the feed, registry
/// and importer. Each component keeps its own state and loading flag.
pub struct MonitorService {
    config: ClientConfig,
    board: Arc<NotificationBoard>,
    feed: FeedController,
    registry: Arc<WalletRegistry>,
    importer: BatchImporter,
}

impl MonitorService {
    /// Build a service talking HTTP to `config.base_url`.
    pub fn connect(config: ClientConfig) -> Result<Self> {
        let transport = HttpTransport::new(&config)?;
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    pub fn with_transport(config: ClientConfig, transport: Arc<dyn Transport>) -> Self {
        let api = MonitorApi::new(transport);
        let board = Arc::new(NotificationBoard::new());
        let registry = Arc::new(WalletRegistry::new(
            api.clone(),
            board.clone(),
            config.delete_confirm_ttl(),
        ));
        let feed = FeedController::new(api.clone(), board.clone(), config.default_page_size);
        let importer = BatchImporter::new(api, board.clone(), registry.clone());
        Self {
            config,
            board,
            feed,
            registry,
            importer,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn feed(&self) -> &FeedController {
        &self.feed
    }

    pub fn registry(&self) -> &WalletRegistry {
        &self.registry
    }

    pub fn importer(&self) -> &BatchImporter {
        &self.importer
    }

    pub fn notification(&self) -> Option<Notification> {
        self.board.current()
    }

    pub fn dismiss_notification(&self) -> Option<Notification> {
        self.board.dismiss()
    }

    /// Initial load: wallet list and first feed page, fetched concurrently.
    /// Each side reports its own failure.
    pub async fn load(&self) -> (bool, bool) {
        let (wallets, feed) = futures::join!(self.registry.list(), self.feed.refresh());
        (wallets.is_ok(), feed.is_ok())
    }
}
