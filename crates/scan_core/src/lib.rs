//! Directory scan coordination
//!
//! This crate contains:
//! - ScanCoordinator: inline vs. offloaded scanning, result aggregation
//! - Worker spawning and the worker message channel
//! - Progress observers
//! - Navigation sessions with scan supersession
//! - Configuration and error types

pub mod config;
pub mod coordinator;
pub mod error;
pub mod observer;
pub mod session;
pub mod worker;

pub use config::{AppConfig, LogConfig, ScanConfig};
pub use coordinator::ScanCoordinator;
pub use error::ScanError;
pub use observer::{ChannelObserver, NoopObserver, ScanObserver};
pub use session::ScanSession;
pub use worker::{
    task_channel, TaskHandle, TaskPort, ThreadSpawner, WorkerEvent, WorkerSpawner,
    EXIT_LISTING_FAILED, EXIT_OK, EXIT_PANICKED, WORKER_THREAD_NAME,
};

pub use scan_fs::{CategoryIndex, FileCategory};
pub use scan_proto::{FileEntry, ProgressEvent, ScanMessage, ScanRequest};
pub use tokio_util::sync::CancellationToken;
