//! Scan coordinator: picks inline or offloaded scanning and aggregates results

use crate::config::ScanConfig;
use crate::observer::{NoopObserver, ScanObserver};
use crate::worker::{TaskHandle, ThreadSpawner, WorkerEvent, WorkerSpawner, EXIT_LISTING_FAILED};
use crate::ScanError;
use scan_fs::{file_info, list_directory, FileSystem, FsError, LocalFileSystem};
use scan_proto::{FileEntry, ProgressEvent, ScanMessage, ScanRequest};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use uuid::Uuid;

/// Entry point for directory scans
///
/// Small directories (fewer immediate children than `inline_threshold`)
/// are listed one level deep without a worker. Larger ones are handed to
/// a tree walker running in its own thread, whose batches are forwarded
/// to the observer and accumulated into the result.
pub struct ScanCoordinator {
    config: ScanConfig,
    fs: Arc<dyn FileSystem>,
    spawner: Arc<dyn WorkerSpawner>,
    observer: Arc<dyn ScanObserver>,
}

impl ScanCoordinator {
    /// Coordinator over the local disk with thread workers
    pub fn new(config: ScanConfig) -> Self {
        let fs: Arc<dyn FileSystem> = Arc::new(LocalFileSystem::new());
        let spawner = Arc::new(ThreadSpawner::new(fs.clone(), &config));
        Self::with_parts(config, fs, spawner)
    }

    pub fn with_parts(
        config: ScanConfig,
        fs: Arc<dyn FileSystem>,
        spawner: Arc<dyn WorkerSpawner>,
    ) -> Self {
        Self {
            config,
            fs,
            spawner,
            observer: Arc::new(NoopObserver),
        }
    }

    /// Register the progress observer
    pub fn on_progress(mut self, observer: impl ScanObserver + 'static) -> Self {
        self.observer = Arc::new(observer);
        self
    }

    /// Describe a single path
    pub async fn file_info(&self, path: impl AsRef<Path>) -> Result<FileEntry, ScanError> {
        let fs = self.fs.clone();
        let path = path.as_ref().to_path_buf();
        blocking(move || file_info(fs.as_ref(), &path))
            .await?
            .map_err(|e| match e {
                FsError::NotFound(p) => ScanError::FileNotFound(p),
                other => other.into(),
            })
    }

    /// Scan a directory
    pub async fn scan(&self, dir: impl AsRef<Path>) -> Result<Vec<FileEntry>, ScanError> {
        self.scan_with_cancel(dir, CancellationToken::new()).await
    }

    /// Scan a directory, stopping early once `cancel` fires
    pub async fn scan_with_cancel(
        &self,
        dir: impl AsRef<Path>,
        cancel: CancellationToken,
    ) -> Result<Vec<FileEntry>, ScanError> {
        let dir = dir.as_ref().to_path_buf();
        if cancel.is_cancelled() {
            return Err(ScanError::Cancelled);
        }

        let fs = self.fs.clone();
        let target = dir.clone();
        let names = blocking(move || list_directory(fs.as_ref(), &target)).await??;
        tracing::info!("Scanning {} ({} items)", dir.display(), names.len());

        if names.len() < self.config.inline_threshold {
            self.scan_inline(dir, names).await
        } else {
            let span = tracing::info_span!("scan", id = %Uuid::new_v4());
            self.scan_offloaded(dir, cancel).instrument(span).await
        }
    }

    /// Stat each immediate child; failures are logged and skipped
    async fn scan_inline(&self, dir: PathBuf, names: Vec<OsString>) -> Result<Vec<FileEntry>, ScanError> {
        let fs = self.fs.clone();

        let files = blocking(move || {
            let mut files = Vec::with_capacity(names.len());
            for name in names {
                let path = dir.join(&name);
                match file_info(fs.as_ref(), &path) {
                    Ok(entry) => files.push(entry),
                    Err(e) => tracing::warn!("Error reading item {}: {}", path.display(), e),
                }
            }
            files
        })
        .await?;

        tracing::debug!(
            "Inline scan found {} entries ({} directories)",
            files.len(),
            files.iter().filter(|f| f.is_dir).count()
        );
        Ok(files)
    }

    async fn scan_offloaded(&self, dir: PathBuf, cancel: CancellationToken) -> Result<Vec<FileEntry>, ScanError> {
        let request = ScanRequest::new(dir.display().to_string())
            .with_max_depth(self.config.offload_max_depth);

        // Stops the worker whenever this scan ends or is dropped
        let worker_cancel = cancel.child_token();
        let _stop_worker = worker_cancel.clone().drop_guard();

        let mut handle = self.spawner.spawn(request, worker_cancel)?;
        tracing::debug!("Worker spawned for {}", dir.display());

        let mut files: Vec<FileEntry> = Vec::new();
        let mut last_error: Option<String> = None;

        loop {
            let event = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tracing::info!("Scan of {} cancelled", dir.display());
                    return Err(ScanError::Cancelled);
                }
                event = self.next_event(&mut handle) => event?,
            };

            let message = match event {
                Some(WorkerEvent::Message(message)) => message,
                Some(WorkerEvent::Error(message)) => {
                    tracing::error!("Worker error: {}", message);
                    return Err(ScanError::WorkerFailure(message));
                }
                Some(WorkerEvent::Exit(code)) => {
                    if cancel.is_cancelled() {
                        return Err(ScanError::Cancelled);
                    }
                    if code == EXIT_LISTING_FAILED {
                        let message = last_error.unwrap_or_else(|| {
                            format!("Failed to scan directory {}", dir.display())
                        });
                        tracing::error!("{}", message);
                        return Err(ScanError::DirectoryListing(message));
                    }
                    tracing::error!("Worker stopped with exit code {} before completing", code);
                    return Err(ScanError::WorkerExitedAbnormally { code });
                }
                None => {
                    return Err(ScanError::WorkerFailure(
                        "Worker channel closed before completion".to_string(),
                    ));
                }
            };

            match message {
                ScanMessage::Start { message } => {
                    self.notify(ProgressEvent::Start { message });
                }
                ScanMessage::Progress { message, total } => {
                    self.notify(ProgressEvent::Progress { message, total });
                }
                ScanMessage::Batch { files: batch } => {
                    let batch_size = batch.len();
                    files.extend(batch);
                    self.notify(ProgressEvent::Batch {
                        count: files.len(),
                        batch_size,
                    });
                }
                ScanMessage::Error { message, .. } => {
                    tracing::warn!("{}", message);
                    last_error = Some(message.clone());
                    self.notify(ProgressEvent::Error { message });
                }
                ScanMessage::Complete { message, total } => {
                    if total != files.len() {
                        tracing::warn!("Worker reported {} entries but sent {}", total, files.len());
                    }
                    tracing::info!("Scan of {} complete: {} entries", dir.display(), files.len());
                    self.notify(ProgressEvent::Complete { message, total });
                    return Ok(files);
                }
            }
        }
    }

    async fn next_event(&self, handle: &mut TaskHandle) -> Result<Option<WorkerEvent>, ScanError> {
        match self.config.worker_timeout() {
            Some(limit) => tokio::time::timeout(limit, handle.next_event())
                .await
                .map_err(|_| ScanError::WorkerFailure(format!("Worker unresponsive for {:?}", limit))),
            None => Ok(handle.next_event().await),
        }
    }

    fn notify(&self, event: ProgressEvent) {
        self.observer.on_progress(&event);
    }
}

/// Run blocking filesystem work off the async executor
async fn blocking<T, F>(f: F) -> Result<T, ScanError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ScanError::Internal(e.to_string()))
}
