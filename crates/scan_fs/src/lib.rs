//! Filesystem layer for directory scanning
//!
//! Provides:
//! - FileSystem: the stat/list seam, with a local implementation
//! - Entry construction from stat results
//! - File categories by extension, and name search over scan results
//! - TreeWalker: the recursive, batching directory walker

mod category;
mod local;
mod search;
mod walker;

pub use category::{CategoryIndex, FileCategory};
pub use local::LocalFileSystem;
pub use search::NameQuery;
pub use walker::{MessageSink, TreeWalker, WalkOutcome};

use scan_proto::FileEntry;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File system errors
#[derive(Error, Debug)]
pub enum FsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Path not found: {0}")]
    NotFound(String),

    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Not a directory: {0}")]
    NotADirectory(String),
}

impl FsError {
    /// Classify an I/O error raised for `path`
    pub fn from_io(path: &Path, err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => FsError::NotFound(path.display().to_string()),
            std::io::ErrorKind::PermissionDenied => {
                FsError::AccessDenied(path.display().to_string())
            }
            _ => FsError::Io(err),
        }
    }
}

pub type Result<T> = std::result::Result<T, FsError>;

/// Parsed result of a stat call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryStat {
    pub size: u64,
    pub modified: Option<i64>,
    pub is_dir: bool,
}

/// Filesystem primitives used by the scanner
pub trait FileSystem: Send + Sync {
    /// Stat a path, following symlinks
    fn stat(&self, path: &Path) -> Result<EntryStat>;

    /// List the raw base names of a directory's immediate children
    fn read_dir(&self, path: &Path) -> Result<Vec<OsString>>;

    /// Resolve a path to its real location
    fn canonicalize(&self, path: &Path) -> Result<PathBuf> {
        Ok(path.to_path_buf())
    }
}

/// Build a file entry for `path` from its stat result
///
/// Names that are not valid UTF-8 are decoded lossily here and only here;
/// the walk itself always joins on the raw name.
pub fn entry_from_stat(path: &Path, stat: EntryStat) -> FileEntry {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string());

    FileEntry {
        path: path.display().to_string(),
        name,
        size: stat.size,
        modified: stat.modified,
        is_dir: stat.is_dir,
    }
}

/// Stat a single path and describe it
pub fn file_info(fs: &dyn FileSystem, path: &Path) -> Result<FileEntry> {
    let stat = fs.stat(path)?;
    Ok(entry_from_stat(path, stat))
}

/// Check that `path` names an existing directory and list its children
pub fn list_directory(fs: &dyn FileSystem, path: &Path) -> Result<Vec<OsString>> {
    let stat = match fs.stat(path) {
        Ok(stat) => stat,
        Err(FsError::NotFound(_)) => {
            return Err(FsError::NotADirectory(path.display().to_string()))
        }
        Err(e) => return Err(e),
    };

    if !stat.is_dir {
        return Err(FsError::NotADirectory(path.display().to_string()));
    }

    fs.read_dir(path)
}
