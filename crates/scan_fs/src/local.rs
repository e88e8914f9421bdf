//! Local disk implementation of the filesystem seam

use crate::{EntryStat, FileSystem, FsError, Result};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

/// Filesystem backed by `std::fs`
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFileSystem;

impl LocalFileSystem {
    pub fn new() -> Self {
        Self
    }
}

impl FileSystem for LocalFileSystem {
    fn stat(&self, path: &Path) -> Result<EntryStat> {
        let metadata = fs::metadata(path).map_err(|e| FsError::from_io(path, e))?;

        let modified = metadata
            .modified()
            .ok()
            .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
            .map(|d| d.as_secs() as i64);

        Ok(EntryStat {
            size: metadata.len(),
            modified,
            is_dir: metadata.is_dir(),
        })
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<OsString>> {
        let mut names = Vec::new();

        for entry in fs::read_dir(path).map_err(|e| FsError::from_io(path, e))? {
            let entry = entry.map_err(|e| FsError::from_io(path, e))?;
            names.push(entry.file_name());
        }

        Ok(names)
    }

    fn canonicalize(&self, path: &Path) -> Result<PathBuf> {
        fs::canonicalize(path).map_err(|e| FsError::from_io(path, e))
    }
}
