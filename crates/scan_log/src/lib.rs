//! Logging & crash reporting for the scanner host
//!
//! Provides structured logging to console and a rolling JSON file, a panic
//! hook that writes crash reports, and cleanup of expired log files.

mod logging;
mod panic_hook;

pub use logging::{cleanup_old_logs, cleanup_logs_in, init_logging};
pub use panic_hook::init_panic_hook;

use directories::ProjectDirs;
use std::path::PathBuf;

/// Get the application log directory
pub fn log_dir() -> PathBuf {
    ProjectDirs::from("com", "DirScan", "DirScan")
        .map(|dirs| dirs.data_dir().join("logs"))
        .unwrap_or_else(|| PathBuf::from("./logs"))
}

/// Initialize logging and the panic hook
///
/// `level` is used when `RUST_LOG` is not set. Panics on
/// `contained_threads` are logged without a crash dump.
pub fn init(level: &str, contained_threads: &'static [&'static str]) -> anyhow::Result<()> {
    init_logging(level)?;
    init_panic_hook(contained_threads);
    Ok(())
}
