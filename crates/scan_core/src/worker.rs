//! Worker spawning and the coordinator <-> worker channel
//!
//! A worker owns a `TaskPort` and posts encoded `ScanMessage` frames, a
//! transport error, or its exit code. The coordinator owns the matching
//! `TaskHandle` and receives those as `WorkerEvent`s in FIFO order.

use crate::config::ScanConfig;
use crate::ScanError;
use scan_fs::{FileSystem, MessageSink, TreeWalker, WalkOutcome};
use scan_proto::{ScanMessage, ScanRequest};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Exit code after `complete`, or after a cancelled walk
pub const EXIT_OK: i32 = 0;
/// Exit code when the top-level directory could not be listed
pub const EXIT_LISTING_FAILED: i32 = 1;
/// Exit code when the walker panicked
pub const EXIT_PANICKED: i32 = 101;

/// Name of every walker thread; panics there are contained by the spawner
pub const WORKER_THREAD_NAME: &str = "tree-walker";

/// Event observed on a worker handle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerEvent {
    Message(ScanMessage),
    /// The channel itself failed (undecodable frame, worker-side transport error)
    Error(String),
    Exit(i32),
}

#[derive(Debug)]
enum Signal {
    Frame(Vec<u8>),
    Error(String),
    Exit(i32),
}

/// Create a connected worker port and coordinator handle
pub fn task_channel() -> (TaskPort, TaskHandle) {
    let (tx, rx) = mpsc::unbounded_channel();
    (TaskPort { tx }, TaskHandle { rx })
}

/// Worker side of the channel
#[derive(Debug)]
pub struct TaskPort {
    tx: mpsc::UnboundedSender<Signal>,
}

impl TaskPort {
    /// Post a message; false once the coordinator stopped listening
    pub fn post(&self, message: &ScanMessage) -> bool {
        match scan_proto::encode(message) {
            Ok(frame) => self.post_frame(frame),
            Err(e) => self.fail(e.to_string()),
        }
    }

    /// Post an already encoded frame
    pub fn post_frame(&self, frame: Vec<u8>) -> bool {
        self.tx.send(Signal::Frame(frame)).is_ok()
    }

    /// Report a transport-level failure
    pub fn fail(&self, message: impl Into<String>) -> bool {
        self.tx.send(Signal::Error(message.into())).is_ok()
    }

    /// Report the worker's exit status; nothing can be posted afterwards
    pub fn exit(self, code: i32) {
        let _ = self.tx.send(Signal::Exit(code));
    }
}

impl MessageSink for TaskPort {
    fn emit(&mut self, message: ScanMessage) {
        if !self.post(&message) {
            tracing::trace!("Coordinator gone, dropping {} message", message.kind());
        }
    }
}

/// Coordinator side of the channel
#[derive(Debug)]
pub struct TaskHandle {
    rx: mpsc::UnboundedReceiver<Signal>,
}

impl TaskHandle {
    /// Next event from the worker, or `None` once every port is gone
    pub async fn next_event(&mut self) -> Option<WorkerEvent> {
        let event = match self.rx.recv().await? {
            Signal::Frame(frame) => match scan_proto::decode(&frame) {
                Ok(message) => WorkerEvent::Message(message),
                Err(e) => WorkerEvent::Error(e.to_string()),
            },
            Signal::Error(message) => WorkerEvent::Error(message),
            Signal::Exit(code) => WorkerEvent::Exit(code),
        };
        Some(event)
    }
}

/// Starts an isolated worker for one scan request
pub trait WorkerSpawner: Send + Sync {
    fn spawn(&self, request: ScanRequest, cancel: CancellationToken) -> Result<TaskHandle, ScanError>;
}

/// Runs each tree walk on its own OS thread
pub struct ThreadSpawner {
    fs: Arc<dyn FileSystem>,
    batch_size: usize,
    detect_cycles: bool,
}

impl ThreadSpawner {
    pub fn new(fs: Arc<dyn FileSystem>, config: &ScanConfig) -> Self {
        Self {
            fs,
            batch_size: config.batch_size,
            detect_cycles: config.detect_cycles,
        }
    }
}

impl WorkerSpawner for ThreadSpawner {
    fn spawn(&self, request: ScanRequest, cancel: CancellationToken) -> Result<TaskHandle, ScanError> {
        let (mut port, handle) = task_channel();
        let fs = self.fs.clone();
        let batch_size = self.batch_size;
        let detect_cycles = self.detect_cycles;

        std::thread::Builder::new()
            .name(WORKER_THREAD_NAME.into())
            .spawn(move || {
                let outcome = std::panic::catch_unwind(AssertUnwindSafe(|| {
                    TreeWalker::new(fs.as_ref())
                        .batch_size(batch_size)
                        .detect_cycles(detect_cycles)
                        .cancel_token(cancel)
                        .run(&request, &mut port)
                }));

                let code = match outcome {
                    Ok(WalkOutcome::Completed { .. }) | Ok(WalkOutcome::Cancelled) => EXIT_OK,
                    Ok(WalkOutcome::Failed) => EXIT_LISTING_FAILED,
                    Err(_) => EXIT_PANICKED,
                };
                port.exit(code);
            })
            .map_err(|e| ScanError::WorkerFailure(format!("Failed to spawn worker: {}", e)))?;

        Ok(handle)
    }
}
