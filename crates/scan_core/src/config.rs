//! Scanner configuration

use directories::ProjectDirs;
use scan_proto::DEFAULT_BATCH_SIZE;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Host configuration, passed explicitly to everything that needs it
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub scan: ScanConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Directories with fewer immediate children are scanned inline
    pub inline_threshold: usize,
    /// Entries per batch message
    pub batch_size: usize,
    /// Recursion bound for offloaded scans
    pub offload_max_depth: usize,
    /// Fail an offloaded scan when the worker is silent this long
    pub worker_timeout_ms: Option<u64>,
    /// Skip directories whose real path was already walked
    pub detect_cycles: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            inline_threshold: 100,
            batch_size: DEFAULT_BATCH_SIZE,
            offload_max_depth: 1,
            worker_timeout_ms: None,
            detect_cycles: true,
        }
    }
}

impl ScanConfig {
    pub fn worker_timeout(&self) -> Option<Duration> {
        self.worker_timeout_ms.map(Duration::from_millis)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Filter used when RUST_LOG is unset
    pub level: String,
    pub retention_days: u32,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            retention_days: 7,
        }
    }
}

impl AppConfig {
    /// Load configuration from the default location
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Load configuration from a file, or defaults if it does not exist
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Self = toml::from_str(&content)?;
            tracing::info!("Configuration loaded from {:?}", path);
            Ok(config)
        } else {
            tracing::info!("Using default configuration");
            Ok(Self::default())
        }
    }

    /// Save configuration to the default location
    pub fn save(&self) -> anyhow::Result<()> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, toml::to_string_pretty(self)?)?;

        tracing::info!("Configuration saved to {:?}", path);
        Ok(())
    }

    /// Get the configuration file path
    pub fn config_path() -> PathBuf {
        ProjectDirs::from("com", "DirScan", "DirScan")
            .map(|dirs| dirs.config_dir().join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("./config.toml"))
    }
}
