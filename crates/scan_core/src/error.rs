//! Scan error types

use scan_fs::FsError;
use thiserror::Error;

/// Errors that reject a `scan()` call
///
/// Per-entry stat failures and unreadable nested directories are not
/// errors at this level; they arrive as advisory `error` progress events.
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Not a directory: {0}")]
    NotADirectory(String),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Directory listing failed: {0}")]
    DirectoryListing(String),

    #[error("Worker failure: {0}")]
    WorkerFailure(String),

    #[error("Worker stopped with exit code {code}")]
    WorkerExitedAbnormally { code: i32 },

    #[error("Scan cancelled")]
    Cancelled,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ScanError {
    /// A cancelled scan was superseded, not broken
    pub fn is_fatal(&self) -> bool {
        !matches!(self, ScanError::Cancelled)
    }

    /// Get a user-friendly message
    pub fn user_message(&self) -> String {
        match self {
            ScanError::NotADirectory(path) => format!("Folder not found: {}", path),
            ScanError::FileNotFound(path) => format!("File not found: {}", path),
            ScanError::DirectoryListing(e) => format!("Cannot open folder: {}", e),
            ScanError::WorkerFailure(_) | ScanError::WorkerExitedAbnormally { .. } => {
                "The folder scan stopped unexpectedly. Please try again.".to_string()
            }
            _ => self.to_string(),
        }
    }
}

impl From<FsError> for ScanError {
    fn from(e: FsError) -> Self {
        match e {
            FsError::NotFound(p) | FsError::NotADirectory(p) => ScanError::NotADirectory(p),
            other => ScanError::DirectoryListing(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fs_error_mapping() {
        let err: ScanError = FsError::NotFound("/gone".into()).into();
        assert!(matches!(err, ScanError::NotADirectory(ref p) if p == "/gone"));

        let err: ScanError = FsError::AccessDenied("/root".into()).into();
        assert!(matches!(err, ScanError::DirectoryListing(ref m) if m == "Access denied: /root"));
    }

    #[test]
    fn test_cancelled_is_not_fatal() {
        assert!(!ScanError::Cancelled.is_fatal());
        assert!(ScanError::WorkerExitedAbnormally { code: 1 }.is_fatal());
        assert_eq!(
            ScanError::WorkerExitedAbnormally { code: 1 }.to_string(),
            "Worker stopped with exit code 1"
        );
    }
}
