//! Navigation session: a newer scan supersedes the one still running

use crate::{ScanCoordinator, ScanError};
use parking_lot::Mutex;
use scan_proto::FileEntry;
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Tracks the scan backing one view
///
/// Each `navigate` cancels whatever scan the session started before it,
/// so the superseded worker stops at its next entry.
pub struct ScanSession {
    coordinator: Arc<ScanCoordinator>,
    current: Mutex<Option<CancellationToken>>,
}

impl ScanSession {
    pub fn new(coordinator: Arc<ScanCoordinator>) -> Self {
        Self {
            coordinator,
            current: Mutex::new(None),
        }
    }

    /// Scan `dir`, cancelling the previous scan of this session
    pub async fn navigate(&self, dir: impl AsRef<Path>) -> Result<Vec<FileEntry>, ScanError> {
        let token = CancellationToken::new();
        let previous = self.current.lock().replace(token.clone());

        if let Some(previous) = previous {
            tracing::debug!("Superseding previous scan");
            previous.cancel();
        }

        self.coordinator.scan_with_cancel(dir, token).await
    }

    /// Cancel the running scan, if any
    pub fn cancel(&self) {
        if let Some(token) = self.current.lock().take() {
            token.cancel();
        }
    }
}
