//! Bulk wallet onboarding from pasted or uploaded text.
//!
//! Input is one wallet per line, `name,address,note`. The client never
//! validates addresses itself; the whole batch goes to the server in a single
//! request and only the aggregate success/error counts come back.

use std::path::Path;
use std::sync::Arc;

use log::{info, warn};
use parking_lot::Mutex;

use crate::error::{MonitorError, Result};
use crate::notify::{Notification, NotificationBoard, Severity};
use crate::registry::WalletRegistry;
use crate::transport::MonitorApi;
use crate::types::{BatchImportResult, WalletDraft};

/// One parsed input line; sent to the server as-is.
pub type ImportRecord = WalletDraft;

/// `Parsing` is synchronous and happens under the importer's lock, so
/// observers only ever see the phases on either side of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportPhase {
    Idle,
    Parsing,
    Submitting,
    Reconciling,
    Done,
    Failed,
}

/// Parse free-form import text. Whitespace-only lines are dropped; every
/// other line yields a record, even one without an address.
pub fn parse_import_text(text: &str) -> Vec<ImportRecord> {
    text.lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            let mut fields = line.split(',').map(str::trim);
            let name = fields.next().unwrap_or_default();
            let address = fields.next().unwrap_or_default();
            let note = fields.next().unwrap_or_default();
            let name = if name.is_empty() { address } else { name };
            ImportRecord {
                name: name.to_string(),
                address: address.to_string(),
                note: note.to_string(),
            }
        })
        .collect()
}

/// Operator-facing outcome of a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSummary {
    pub severity: Severity,
    pub lines: Vec<String>,
    pub result: BatchImportResult,
}

impl ImportSummary {
    pub fn message(&self) -> String {
        self.lines.join("\n")
    }

    pub fn to_notification(&self) -> Notification {
        Notification {
            kind: self.severity,
            message: self.message(),
        }
    }
}

/// Turn the server's counts into a summary. The server does not say which
/// rows failed, so the duplicate-address explanation is only a likely cause.
pub fn reconcile(result: &BatchImportResult) -> ImportSummary {
    let mut lines = Vec::new();
    if result.total_success > 0 {
        lines.push(format!("Imported {} wallet(s)", result.total_success));
    }
    if result.total_errors > 0 {
        lines.push(format!(
            "{} wallet(s) failed to import (likely duplicate addresses)",
            result.total_errors
        ));
    }
    if lines.is_empty() {
        lines.push("Nothing was imported".to_string());
    }

    let severity = if result.total_errors == 0 {
        Severity::Success
    } else if result.total_success == 0 {
        Severity::Error
    } else {
        Severity::Warning
    };

    ImportSummary {
        severity,
        lines,
        result: *result,
    }
}

/// Appended to the summary when the post-import wallet reload fails.
pub const STALE_WALLETS_LINE: &str = "Wallet list could not be refreshed";

struct ImporterInner {
    phase: ImportPhase,
    surface_open: bool,
    text: String,
    last_summary: Option<ImportSummary>,
}

/// Marks an abandoned submit as failed so the input can be resubmitted.
struct SubmitGuard<'a>(&'a Mutex<ImporterInner>);

impl Drop for SubmitGuard<'_> {
    fn drop(&mut self) {
        let mut inner = self.0.lock();
        if matches!(
            inner.phase,
            ImportPhase::Submitting | ImportPhase::Reconciling
        ) {
            warn!("batch import abandoned in phase {:?}", inner.phase);
            inner.phase = ImportPhase::Failed;
        }
    }
}

pub struct BatchImporter {
    api: MonitorApi,
    board: Arc<NotificationBoard>,
    registry: Arc<WalletRegistry>,
    inner: Mutex<ImporterInner>,
}

impl BatchImporter {
    pub fn new(
        api: MonitorApi,
        board: Arc<NotificationBoard>,
        registry: Arc<WalletRegistry>,
    ) -> Self {
        Self {
            api,
            board,
            registry,
            inner: Mutex::new(ImporterInner {
                phase: ImportPhase::Idle,
                surface_open: false,
                text: String::new(),
                last_summary: None,
            }),
        }
    }

    pub fn phase(&self) -> ImportPhase {
        self.inner.lock().phase
    }

    /// True only while the batch request is outstanding.
    pub fn loading(&self) -> bool {
        self.phase() == ImportPhase::Submitting
    }

    pub fn is_open(&self) -> bool {
        self.inner.lock().surface_open
    }

    pub fn text(&self) -> String {
        self.inner.lock().text.clone()
    }

    pub fn last_summary(&self) -> Option<ImportSummary> {
        self.inner.lock().last_summary.clone()
    }

    /// Open the import surface with empty input.
    pub fn open(&self) {
        let mut inner = self.inner.lock();
        inner.surface_open = true;
        inner.text.clear();
        inner.phase = ImportPhase::Idle;
    }

    /// Close the import surface, discarding any input.
    pub fn close(&self) {
        let mut inner = self.inner.lock();
        inner.surface_open = false;
        inner.text.clear();
    }

    pub fn set_text(&self, text: impl Into<String>) {
        let mut inner = self.inner.lock();
        inner.surface_open = true;
        inner.text = text.into();
    }

    /// Replace the input with the contents of an uploaded `.csv`/`.txt` file.
    pub async fn load_file(&self, path: &Path) -> Result<()> {
        let text = tokio::fs::read_to_string(path).await.map_err(|e| {
            let err = MonitorError::Validation(format!("Cannot read {}: {e}", path.display()));
            self.board.post(Notification::failure("Failed to load import file", &err));
            err
        })?;
        self.set_text(text);
        Ok(())
    }

    /// Parse the current input, submit it as one batch and reconcile the
    /// outcome. On success the wallet list is refreshed and the surface is
    /// closed; on failure the input is kept so the operator can retry.
    pub async fn submit(&self) -> Result<ImportSummary> {
        let records = {
            let mut inner = self.inner.lock();
            if inner.phase == ImportPhase::Submitting {
                return Err(MonitorError::Validation(
                    "An import is already in progress.".into(),
                ));
            }
            inner.phase = ImportPhase::Parsing;
            let records = parse_import_text(&inner.text);
            inner.phase = if records.is_empty() {
                ImportPhase::Idle
            } else {
                ImportPhase::Submitting
            };
            records
        };

        if records.is_empty() {
            let err = MonitorError::Validation("Nothing to import.".into());
            self.board.post(Notification::failure("Batch import", &err));
            return Err(err);
        }

        let _submitting = SubmitGuard(&self.inner);
        info!("submitting batch import of {} wallet(s)", records.len());
        let result = match self.api.batch_import(&records).await {
            Ok(result) => result,
            Err(err) => {
                warn!("batch import failed: {err}");
                self.inner.lock().phase = ImportPhase::Failed;
                self.board.post(Notification::failure("Batch import failed", &err));
                return Err(err);
            }
        };

        self.inner.lock().phase = ImportPhase::Reconciling;
        let outcomes = result.total_success.saturating_add(result.total_errors);
        if outcomes > records.len() as u64 {
            warn!(
                "server reported {outcomes} outcomes for {} submitted records",
                records.len()
            );
        }
        let mut summary = reconcile(&result);
        info!(
            "batch import done: {} imported, {} failed",
            result.total_success, result.total_errors
        );

        // The import summary is posted after the reload so it is the one left
        // visible; a failed reload is folded into it.
        if let Err(err) = self.registry.list().await {
            warn!("wallet reload after import failed: {err}");
            summary.lines.push(STALE_WALLETS_LINE.to_string());
        }

        {
            let mut inner = self.inner.lock();
            inner.surface_open = false;
            inner.text.clear();
            inner.phase = ImportPhase::Done;
            inner.last_summary = Some(summary.clone());
        }
        self.board.post(summary.to_notification());
        Ok(summary)
    }
}
