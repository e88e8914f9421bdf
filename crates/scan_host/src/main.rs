//! DirScan host process
//!
//! Wires logging, configuration and a scan coordinator, then scans the
//! directory given as the first argument (default: the working directory).
//! An optional second argument is a name query; matching paths are listed
//! in the summary. Progress events and the summary go to stdout as JSON lines.

use anyhow::Result;
use scan_core::{AppConfig, CategoryIndex, ProgressEvent, ScanCoordinator, WORKER_THREAD_NAME};
use std::path::PathBuf;

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::load().unwrap_or_default();

    scan_log::init(&config.log.level, &[WORKER_THREAD_NAME])?;

    if let Err(e) = scan_log::cleanup_old_logs(config.log.retention_days) {
        tracing::warn!("Failed to cleanup old logs: {}", e);
    }

    tracing::info!("DirScan host starting...");

    // First run: leave an editable copy of the defaults behind
    if !AppConfig::config_path().exists() {
        if let Err(e) = config.save() {
            tracing::warn!("Failed to write default configuration: {}", e);
        }
    }

    let mut args = std::env::args().skip(1);
    let dir = match args.next() {
        Some(arg) => PathBuf::from(arg),
        None => std::env::current_dir()?,
    };
    let query = args.next();

    let coordinator = ScanCoordinator::new(config.scan).on_progress(print_event);

    match coordinator.scan(&dir).await {
        Ok(files) => {
            let index = CategoryIndex::build(&files);
            let mut summary = serde_json::json!({
                "status": "result",
                "path": dir.display().to_string(),
                "total": files.len(),
                "categories": index.counts(),
            });
            if let Some(query) = &query {
                let matches: Vec<&str> = index
                    .search(query, None)
                    .into_iter()
                    .map(|entry| entry.path.as_str())
                    .collect();
                summary["matches"] = serde_json::json!(matches);
            }
            println!("{}", summary);
            Ok(())
        }
        Err(e) => {
            tracing::error!("Failed to scan {}: {}", dir.display(), e);
            anyhow::bail!(e.user_message())
        }
    }
}

fn print_event(event: &ProgressEvent) {
    match serde_json::to_string(event) {
        Ok(line) => println!("{}", line),
        Err(e) => tracing::warn!("Failed to encode progress event: {}", e),
    }
}
