//! Structured logging setup with tracing

use std::path::Path;
use std::time::{Duration, SystemTime};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize the logging system
pub fn init_logging(level: &str) -> anyhow::Result<()> {
    let log_dir = super::log_dir();
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = RollingFileAppender::new(Rotation::DAILY, &log_dir, "scan.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    // The writer must outlive every scan; the host never tears logging down
    std::mem::forget(guard);

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    #[cfg(debug_assertions)]
    {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().pretty().with_writer(std::io::stderr))
            .with(fmt::layer().json().with_writer(non_blocking))
            .try_init()?;
    }

    #[cfg(not(debug_assertions))]
    {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().json().with_writer(non_blocking))
            .try_init()?;
    }

    tracing::info!("Logging initialized in {:?}", log_dir);
    Ok(())
}

/// Clean up log files in the log directory older than `days`
pub fn cleanup_old_logs(days: u32) -> anyhow::Result<usize> {
    cleanup_logs_in(&super::log_dir(), days)
}

/// Clean up `.log` files in `dir` whose last write is older than `days`
pub fn cleanup_logs_in(dir: &Path, days: u32) -> anyhow::Result<usize> {
    if !dir.exists() {
        return Ok(0);
    }

    let threshold = SystemTime::now() - Duration::from_secs(days as u64 * 24 * 60 * 60);
    let mut deleted = 0;

    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();

        // Rolling files are named "scan.log.YYYY-MM-DD"
        let is_log = path
            .file_name()
            .map(|n| n.to_string_lossy().contains(".log"))
            .unwrap_or(false);
        if !is_log {
            continue;
        }

        let expired = std::fs::metadata(&path)
            .and_then(|m| m.modified())
            .map(|modified| modified < threshold)
            .unwrap_or(false);

        if expired && std::fs::remove_file(&path).is_ok() {
            deleted += 1;
            tracing::debug!("Deleted old log: {:?}", path);
        }
    }

    tracing::info!("Cleaned up {} old log files", deleted);
    Ok(deleted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_cleanup_keeps_fresh_logs() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("scan.log.2026-10-16"), b"{}").unwrap();
        std::fs::write(temp_dir.path().join("notes.txt"), b"keep").unwrap();

        let deleted = cleanup_logs_in(temp_dir.path(), 7).unwrap();
        assert_eq!(deleted, 0);
        assert!(temp_dir.path().join("scan.log.2026-10-16").exists());
    }

    #[test]
    fn test_cleanup_with_zero_retention_removes_logs_only() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("scan.log.2026-10-15"), b"{}").unwrap();
        std::fs::write(temp_dir.path().join("notes.txt"), b"keep").unwrap();

        // Files written before "now" are older than a zero-day window
        std::thread::sleep(Duration::from_millis(20));

        let deleted = cleanup_logs_in(temp_dir.path(), 0).unwrap();
        assert_eq!(deleted, 1);
        assert!(temp_dir.path().join("notes.txt").exists());
    }

    #[test]
    fn test_cleanup_missing_dir() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("nope");
        assert_eq!(cleanup_logs_in(&missing, 7).unwrap(), 0);
    }
}
