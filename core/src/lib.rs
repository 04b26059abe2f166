pub mod aggregate;
pub mod config;
pub mod display;
pub mod error;
pub mod feed;
pub mod import;
pub mod notify;
pub mod registry;
pub mod service;
pub mod transport;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use aggregate::{TokenGroup, TokenSlot};
pub use config::ClientConfig;
pub use error::MonitorError;
pub use feed::{FeedController, FetchOutcome, PageState};
pub use import::{BatchImporter, ImportPhase, ImportRecord, ImportSummary};
pub use notify::{Notification, NotificationBoard, Severity};
pub use registry::{DeleteToken, WalletRegistry};
pub use service::MonitorService;
pub use transport::{HttpTransport, MonitorApi, Transport};
pub use types::{BatchImportResult, RecordId, Token, Transaction, TxType, Wallet, WalletDraft};
