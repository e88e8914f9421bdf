//! Message protocol between the scan coordinator and tree walker workers
//!
//! This crate defines the data that crosses the worker boundary:
//! discovered entries, the scan request payload, the walker's lifecycle
//! messages and the progress events relayed to the display layer.

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;

/// Number of entries carried by every full batch
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// One discovered filesystem node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    /// Absolute path, unique within one scan
    pub path: String,
    /// Final path segment
    pub name: String,
    /// Byte length (as reported by stat for directories)
    pub size: u64,
    /// Last modification, seconds since the Unix epoch
    pub modified: Option<i64>,
    pub is_dir: bool,
}

impl FileEntry {
    /// Lower-cased extension of the entry name, empty if there is none
    pub fn extension(&self) -> String {
        match self.name.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() => ext.to_lowercase(),
            _ => String::new(),
        }
    }
}

/// Input to a walk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanRequest {
    pub dir_path: String,
    /// Recursion bound; `Some(0)` lists the top level only, `None` is unlimited
    pub max_depth: Option<usize>,
}

impl ScanRequest {
    /// Unbounded request for a directory
    pub fn new(dir_path: impl Into<String>) -> Self {
        Self {
            dir_path: dir_path.into(),
            max_depth: None,
        }
    }

    /// Bound the recursion depth
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = Some(max_depth);
        self
    }

    /// Whether a directory found at `depth` may be descended into
    pub fn allows_descent(&self, depth: usize) -> bool {
        self.max_depth.map_or(true, |max| depth < max)
    }
}

/// Lifecycle messages emitted by a tree walker, in emission order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScanMessage {
    /// Always the first message of a walk
    Start { message: String },

    /// Top-level listing finished. `total` is the immediate entry count only,
    /// not a tree-wide total.
    Progress { message: String, total: usize },

    /// A bounded group of newly discovered entries
    Batch { files: Vec<FileEntry> },

    /// Walk finished; `total` counts every entry sent in batches
    Complete { message: String, total: usize },

    /// A non-fatal failure on one path (stat or nested listing)
    Error { path: String, message: String },
}

impl ScanMessage {
    /// Short name of the variant, used in logs
    pub fn kind(&self) -> &'static str {
        match self {
            ScanMessage::Start { .. } => "start",
            ScanMessage::Progress { .. } => "progress",
            ScanMessage::Batch { .. } => "batch",
            ScanMessage::Complete { .. } => "complete",
            ScanMessage::Error { .. } => "error",
        }
    }
}

/// Progress notifications relayed to the display layer
///
/// Serialized with a `status` tag so the UI can dispatch on it directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ProgressEvent {
    Start { message: String },
    Progress { message: String, total: usize },
    Batch {
        /// Entries accumulated so far
        count: usize,
        /// Entries in the batch that just arrived
        batch_size: usize,
    },
    Complete { message: String, total: usize },
    Error { message: String },
}

/// Frame codec errors
#[derive(Error, Debug)]
pub enum ProtoError {
    #[error("Failed to encode frame: {0}")]
    Encode(String),

    #[error("Failed to decode frame: {0}")]
    Decode(String),
}

/// Encode a value into a transport frame
pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, ProtoError> {
    bincode::serialize(value).map_err(|e| ProtoError::Encode(e.to_string()))
}

/// Decode a transport frame
pub fn decode<T: DeserializeOwned>(frame: &[u8]) -> Result<T, ProtoError> {
    bincode::deserialize(frame).map_err(|e| ProtoError::Decode(e.to_string()))
}
