//! Recursive directory walker with fixed-size batching
//!
//! The walk is depth-first and pre-order: a directory's own entry is
//! buffered before its children are listed, and its subtree is finished
//! before the next sibling is visited. Entries are handed to the sink in
//! batches of exactly `batch_size`, with one final short batch.

use crate::{entry_from_stat, FileSystem};
use scan_proto::{FileEntry, ScanMessage, ScanRequest, DEFAULT_BATCH_SIZE};
use std::collections::HashSet;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;

/// Receiver of walker lifecycle messages
pub trait MessageSink {
    fn emit(&mut self, message: ScanMessage);
}

impl MessageSink for Vec<ScanMessage> {
    fn emit(&mut self, message: ScanMessage) {
        self.push(message);
    }
}

/// How a walk ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkOutcome {
    /// `complete` was emitted
    Completed { total: usize },
    /// The top-level directory could not be listed
    Failed,
    /// The cancellation token fired mid-walk
    Cancelled,
}

/// Recursive enumerator producing batches and lifecycle messages
pub struct TreeWalker<'a> {
    fs: &'a dyn FileSystem,
    batch_size: usize,
    detect_cycles: bool,
    cancel: CancellationToken,
}

impl<'a> TreeWalker<'a> {
    pub fn new(fs: &'a dyn FileSystem) -> Self {
        Self {
            fs,
            batch_size: DEFAULT_BATCH_SIZE,
            detect_cycles: true,
            cancel: CancellationToken::new(),
        }
    }

    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Never descend into the same real directory twice
    pub fn detect_cycles(mut self, detect_cycles: bool) -> Self {
        self.detect_cycles = detect_cycles;
        self
    }

    /// Token checked before every entry
    pub fn cancel_token(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Walk `request.dir_path`, emitting every message into `sink`
    pub fn run(&self, request: &ScanRequest, sink: &mut dyn MessageSink) -> WalkOutcome {
        let root = PathBuf::from(&request.dir_path);
        tracing::debug!("Walk started: {} (max depth {:?})", root.display(), request.max_depth);

        sink.emit(ScanMessage::Start {
            message: format!("Starting scan of {}...", root.display()),
        });

        let mut walk = Walk {
            walker: self,
            request,
            sink,
            pending: Vec::with_capacity(self.batch_size),
            total: 0,
            visited: HashSet::new(),
        };

        let outcome = walk.run(&root);
        if let WalkOutcome::Completed { total } = outcome {
            tracing::debug!("Walk finished: {} ({} entries)", root.display(), total);
        }
        outcome
    }
}

struct Walk<'w, 'a> {
    walker: &'w TreeWalker<'a>,
    request: &'w ScanRequest,
    sink: &'w mut dyn MessageSink,
    pending: Vec<FileEntry>,
    total: usize,
    visited: HashSet<PathBuf>,
}

/// A directory being enumerated
struct Frame {
    dir: PathBuf,
    depth: usize,
    names: std::vec::IntoIter<OsString>,
}

impl Walk<'_, '_> {
    fn run(&mut self, root: &Path) -> WalkOutcome {
        let names = match self.walker.fs.read_dir(root) {
            Ok(names) => names,
            Err(e) => {
                self.report(root, format!("Failed to scan directory {}: {}", root.display(), e));
                return WalkOutcome::Failed;
            }
        };

        self.sink.emit(ScanMessage::Progress {
            message: format!("Scanning {}...", root.display()),
            total: names.len(),
        });

        self.first_visit(root);
        let mut stack = vec![Frame {
            dir: root.to_path_buf(),
            depth: 0,
            names: names.into_iter(),
        }];

        while let Some(frame) = stack.last_mut() {
            let Some(name) = frame.names.next() else {
                stack.pop();
                continue;
            };

            if self.walker.cancel.is_cancelled() {
                tracing::debug!("Walk cancelled: {}", root.display());
                return WalkOutcome::Cancelled;
            }

            let depth = frame.depth;
            let path = frame.dir.join(&name);

            let stat = match self.walker.fs.stat(&path) {
                Ok(stat) => stat,
                Err(e) => {
                    self.report(&path, format!("Failed to read entry {}: {}", path.display(), e));
                    continue;
                }
            };

            self.push(entry_from_stat(&path, stat));

            if !stat.is_dir || !self.request.allows_descent(depth) || !self.first_visit(&path) {
                continue;
            }

            // A subtree that cannot be listed is skipped; its siblings still are walked
            match self.walker.fs.read_dir(&path) {
                Ok(names) => stack.push(Frame {
                    dir: path,
                    depth: depth + 1,
                    names: names.into_iter(),
                }),
                Err(e) => {
                    self.report(&path, format!("Failed to scan directory {}: {}", path.display(), e));
                }
            }
        }

        self.flush();
        self.sink.emit(ScanMessage::Complete {
            message: format!("Scan complete, found {} files/folders", self.total),
            total: self.total,
        });

        WalkOutcome::Completed { total: self.total }
    }

    fn push(&mut self, entry: FileEntry) {
        self.pending.push(entry);
        self.total += 1;

        if self.pending.len() >= self.walker.batch_size {
            self.flush();
        }
    }

    fn flush(&mut self) {
        if self.pending.is_empty() {
            return;
        }

        let files = std::mem::replace(&mut self.pending, Vec::with_capacity(self.walker.batch_size));
        self.sink.emit(ScanMessage::Batch { files });
    }

    fn report(&mut self, path: &Path, message: String) {
        tracing::debug!("{}", message);
        self.sink.emit(ScanMessage::Error {
            path: path.display().to_string(),
            message,
        });
    }

    /// Record a directory descent; false if its real path was already walked
    fn first_visit(&mut self, dir: &Path) -> bool {
        if !self.walker.detect_cycles {
            return true;
        }

        match self.walker.fs.canonicalize(dir) {
            Ok(real) => {
                let fresh = self.visited.insert(real);
                if !fresh {
                    tracing::debug!("Skipping already visited directory: {}", dir.display());
                }
                fresh
            }
            Err(_) => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemoryFs;
    use crate::LocalFileSystem;
    use std::fs;
    use tempfile::TempDir;

    fn walk(fs: &dyn FileSystem, request: ScanRequest) -> (WalkOutcome, Vec<ScanMessage>) {
        let mut messages = Vec::new();
        let outcome = TreeWalker::new(fs).run(&request, &mut messages);
        (outcome, messages)
    }

    fn batches(messages: &[ScanMessage]) -> Vec<Vec<FileEntry>> {
        messages
            .iter()
            .filter_map(|m| match m {
                ScanMessage::Batch { files } => Some(files.clone()),
                _ => None,
            })
            .collect()
    }

    fn entries(messages: &[ScanMessage]) -> Vec<FileEntry> {
        batches(messages).into_iter().flatten().collect()
    }

    fn error_count(messages: &[ScanMessage]) -> usize {
        messages
            .iter()
            .filter(|m| matches!(m, ScanMessage::Error { .. }))
            .count()
    }

    #[test]
    fn test_flat_directory_batches() {
        let mut fs = MemoryFs::new("/d");
        fs.files("/d", 250);

        let (outcome, messages) = walk(&fs, ScanRequest::new("/d"));

        assert_eq!(outcome, WalkOutcome::Completed { total: 250 });
        assert!(matches!(messages[0], ScanMessage::Start { .. }));
        assert!(matches!(messages[1], ScanMessage::Progress { total: 250, .. }));

        let sizes: Vec<usize> = batches(&messages).iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![100, 100, 50]);

        match messages.last() {
            Some(ScanMessage::Complete { total, .. }) => assert_eq!(*total, 250),
            other => panic!("Expected complete, got {:?}", other),
        }

        let paths: HashSet<String> = entries(&messages).into_iter().map(|e| e.path).collect();
        assert_eq!(paths.len(), 250);
    }

    #[test]
    fn test_exact_multiple_has_no_empty_batch() {
        let mut fs = MemoryFs::new("/d");
        fs.files("/d", 200);

        let (_, messages) = walk(&fs, ScanRequest::new("/d"));
        let sizes: Vec<usize> = batches(&messages).iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![100, 100]);
    }

    #[test]
    fn test_empty_directory() {
        let fs = MemoryFs::new("/empty");

        let (outcome, messages) = walk(&fs, ScanRequest::new("/empty"));

        assert_eq!(outcome, WalkOutcome::Completed { total: 0 });
        assert_eq!(messages.len(), 3);
        assert!(matches!(messages[1], ScanMessage::Progress { total: 0, .. }));
        assert!(matches!(messages[2], ScanMessage::Complete { total: 0, .. }));
        assert!(batches(&messages).is_empty());
    }

    #[test]
    fn test_depth_zero_lists_top_level_only() {
        let mut fs = MemoryFs::new("/d");
        fs.dir("/d/sub").files("/d/sub", 5).file("/d/top.txt", 1);

        let (outcome, messages) = walk(&fs, ScanRequest::new("/d").with_max_depth(0));

        assert_eq!(outcome, WalkOutcome::Completed { total: 2 });
        let found = entries(&messages);
        assert!(found.iter().any(|e| e.path == "/d/sub" && e.is_dir));
        assert!(!found.iter().any(|e| e.path.starts_with("/d/sub/")));
    }

    #[test]
    fn test_depth_one_stops_at_grandchildren() {
        let mut fs = MemoryFs::new("/d");
        fs.dir("/d/sub")
            .file("/d/sub/child.txt", 1)
            .dir("/d/sub/deeper")
            .file("/d/sub/deeper/grandchild.txt", 1);

        let (outcome, messages) = walk(&fs, ScanRequest::new("/d").with_max_depth(1));

        assert_eq!(outcome, WalkOutcome::Completed { total: 3 });
        let found = entries(&messages);
        assert!(found.iter().any(|e| e.path == "/d/sub/child.txt"));
        assert!(found.iter().any(|e| e.path == "/d/sub/deeper"));
        assert!(!found.iter().any(|e| e.path.starts_with("/d/sub/deeper/")));
    }

    #[test]
    fn test_unbounded_walk_is_preorder() {
        let mut fs = MemoryFs::new("/d");
        fs.dir("/d/a")
            .dir("/d/a/inner")
            .file("/d/a/inner/x.txt", 1)
            .file("/d/a/y.txt", 1)
            .dir("/d/b")
            .file("/d/b/z.txt", 1);

        let (outcome, messages) = walk(&fs, ScanRequest::new("/d"));
        assert_eq!(outcome, WalkOutcome::Completed { total: 6 });

        let order: Vec<String> = entries(&messages).into_iter().map(|e| e.path).collect();
        assert_eq!(
            order,
            vec![
                "/d/a",
                "/d/a/inner",
                "/d/a/inner/x.txt",
                "/d/a/y.txt",
                "/d/b",
                "/d/b/z.txt",
            ]
        );
    }

    #[test]
    fn test_stat_failure_is_isolated() {
        let mut fs = MemoryFs::new("/d");
        fs.files("/d", 150).break_stat("/d/f0042.txt");

        let (outcome, messages) = walk(&fs, ScanRequest::new("/d"));

        assert_eq!(outcome, WalkOutcome::Completed { total: 149 });
        assert_eq!(entries(&messages).len(), 149);
        assert_eq!(error_count(&messages), 1);
        assert!(messages.iter().any(|m| matches!(
            m,
            ScanMessage::Error { path, .. } if path == "/d/f0042.txt"
        )));
    }

    #[test]
    fn test_nested_listing_failure_skips_subtree() {
        let mut fs = MemoryFs::new("/d");
        fs.dir("/d/locked")
            .file("/d/locked/secret.txt", 1)
            .dir("/d/open")
            .file("/d/open/ok.txt", 1)
            .break_list("/d/locked");

        let (outcome, messages) = walk(&fs, ScanRequest::new("/d"));

        assert_eq!(outcome, WalkOutcome::Completed { total: 3 });
        assert_eq!(error_count(&messages), 1);
        let found = entries(&messages);
        assert!(found.iter().any(|e| e.path == "/d/locked"));
        assert!(found.iter().any(|e| e.path == "/d/open/ok.txt"));
        assert!(!found.iter().any(|e| e.path == "/d/locked/secret.txt"));
    }

    #[test]
    fn test_top_level_listing_failure_never_completes() {
        let mut fs = MemoryFs::new("/d");
        fs.files("/d", 3).break_list("/d");

        let (outcome, messages) = walk(&fs, ScanRequest::new("/d"));

        assert_eq!(outcome, WalkOutcome::Failed);
        assert_eq!(messages.len(), 2);
        assert!(matches!(messages[0], ScanMessage::Start { .. }));
        assert!(matches!(messages[1], ScanMessage::Error { .. }));
    }

    #[test]
    fn test_cancelled_walk_stops() {
        let mut fs = MemoryFs::new("/d");
        fs.files("/d", 10);

        let cancel = CancellationToken::new();
        cancel.cancel();

        let mut messages = Vec::new();
        let outcome = TreeWalker::new(&fs)
            .cancel_token(cancel)
            .run(&ScanRequest::new("/d"), &mut messages);

        assert_eq!(outcome, WalkOutcome::Cancelled);
        assert!(batches(&messages).is_empty());
        assert!(!messages.iter().any(|m| matches!(m, ScanMessage::Complete { .. })));
    }

    #[test]
    fn test_symlink_cycle_is_not_followed() {
        let mut fs = MemoryFs::new("/d");
        fs.file("/d/a.txt", 1).link("/d/loop", "/d");

        let (outcome, messages) = walk(&fs, ScanRequest::new("/d"));

        assert_eq!(outcome, WalkOutcome::Completed { total: 2 });
        assert_eq!(error_count(&messages), 0);
    }

    #[test]
    fn test_custom_batch_size_partitions_nested_tree() {
        let mut fs = MemoryFs::new("/d");
        fs.dir("/d/one").files("/d/one", 7).dir("/d/two").files("/d/two", 6);

        let mut messages = Vec::new();
        let outcome = TreeWalker::new(&fs)
            .batch_size(4)
            .run(&ScanRequest::new("/d"), &mut messages);

        assert_eq!(outcome, WalkOutcome::Completed { total: 15 });
        let sizes: Vec<usize> = batches(&messages).iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![4, 4, 4, 3]);

        let paths: HashSet<String> = entries(&messages).into_iter().map(|e| e.path).collect();
        assert_eq!(paths.len(), 15);
    }

    #[test]
    fn test_local_tree() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir(root.join("music")).unwrap();
        fs::write(root.join("music").join("track.mp3"), b"id3").unwrap();
        fs::write(root.join("cover.png"), b"png").unwrap();

        let local = LocalFileSystem::new();
        let request = ScanRequest::new(root.display().to_string());
        let (outcome, messages) = walk(&local, request);

        assert_eq!(outcome, WalkOutcome::Completed { total: 3 });
        let found = entries(&messages);
        let track = found.iter().find(|e| e.name == "track.mp3").unwrap();
        assert_eq!(track.size, 3);
        assert!(found.iter().any(|e| e.name == "music" && e.is_dir));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_non_utf8_names_are_walked() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::write(root.join("ok.txt"), b"ok").unwrap();
        fs::write(root.join(OsStr::from_bytes(b"caf\xe9.txt")), b"latin1").unwrap();
        let odd_dir = root.join(OsStr::from_bytes(b"d\xfcr"));
        fs::create_dir(&odd_dir).unwrap();
        fs::write(odd_dir.join("inner.txt"), b"x").unwrap();

        let local = LocalFileSystem::new();
        let (outcome, messages) = walk(&local, ScanRequest::new(root.display().to_string()));

        assert_eq!(outcome, WalkOutcome::Completed { total: 4 });
        assert_eq!(error_count(&messages), 0);
        let found = entries(&messages);
        assert!(found.iter().any(|e| e.name == "caf\u{fffd}.txt" && e.size == 6));
        assert!(found.iter().any(|e| e.name == "d\u{fffd}r" && e.is_dir));
        assert!(found.iter().any(|e| e.name == "inner.txt"));
    }
}
