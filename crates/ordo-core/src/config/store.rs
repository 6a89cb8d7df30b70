use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{OrdoError, Result};

/// Configuration for the event store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Path to the store directory
    pub path: PathBuf,

    /// Maximum map size for LMDB (in bytes)
    /// Default: 1GB
    #[serde(default = "default_map_size")]
    pub map_size: usize,

    /// Maximum number of concurrent readers (LMDB specific)
    /// Default: 126
    #[serde(default = "default_max_readers")]
    pub max_readers: u32,

    /// Sync mode for durability
    #[serde(default)]
    pub sync_mode: SyncMode,

    /// How long `open` waits for another handle on the same path to close
    /// (milliseconds, default: 1000)
    #[serde(default = "default_open_timeout")]
    pub open_timeout_ms: u64,

    /// Representation of global order log entries
    ///
    /// Only honoured when the store is created. Reopening an existing store
    /// with a different mode is a configuration error.
    #[serde(default)]
    pub global_entry_mode: GlobalEntryMode,

    /// Maximum size of a single encoded event in bytes (default: 4MB)
    #[serde(default = "default_max_event_size")]
    pub max_event_size_bytes: usize,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum SyncMode {
    /// Full durability – calls `fsync()` on every commit.
    Full,

    /// Skips syncing the LMDB meta-page on each commit (default).
    ///
    /// Committed data survives process crashes. An OS crash may lose the last
    /// transaction but leaves the database consistent.
    #[default]
    NoMetaSync,

    /// Disables `fsync()` entirely. Only for ephemeral or test workloads.
    NoSync,
}

/// Representation of entries in the global order log
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum GlobalEntryMode {
    /// Store a full copy of the encoded event. Global replay never touches
    /// aggregate keyspaces.
    #[default]
    Copy,

    /// Store `"<keyspace>:<sequence>"` and dereference it on read.
    Pointer,
}

impl GlobalEntryMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            GlobalEntryMode::Copy => "copy",
            GlobalEntryMode::Pointer => "pointer",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "copy" => Ok(GlobalEntryMode::Copy),
            "pointer" => Ok(GlobalEntryMode::Pointer),
            other => Err(OrdoError::Config(format!(
                "unknown global entry mode '{}'",
                other
            ))),
        }
    }
}

impl std::fmt::Display for GlobalEntryMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

fn default_map_size() -> usize {
    1024 * 1024 * 1024 // 1GB
}

fn default_max_readers() -> u32 {
    126
}

fn default_open_timeout() -> u64 {
    1000
}

fn default_max_event_size() -> usize {
    4 * 1024 * 1024
}

impl StoreConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            map_size: default_map_size(),
            max_readers: default_max_readers(),
            sync_mode: SyncMode::default(),
            open_timeout_ms: default_open_timeout(),
            global_entry_mode: GlobalEntryMode::default(),
            max_event_size_bytes: default_max_event_size(),
        }
    }

    pub fn with_map_size(mut self, map_size: usize) -> Self {
        self.map_size = map_size;
        self
    }

    pub fn with_max_readers(mut self, max_readers: u32) -> Self {
        self.max_readers = max_readers;
        self
    }

    pub fn with_sync_mode(mut self, sync_mode: SyncMode) -> Self {
        self.sync_mode = sync_mode;
        self
    }

    /// Set how long `open` waits for the path to become free, in milliseconds
    pub fn with_open_timeout(mut self, timeout_ms: u64) -> Self {
        self.open_timeout_ms = timeout_ms;
        self
    }

    pub fn with_global_entry_mode(mut self, mode: GlobalEntryMode) -> Self {
        self.global_entry_mode = mode;
        self
    }

    /// Set maximum encoded event size in bytes.
    pub fn with_max_event_size(mut self, size_bytes: usize) -> Self {
        self.max_event_size_bytes = size_bytes;
        self
    }

    pub fn open_timeout(&self) -> Duration {
        Duration::from_millis(self.open_timeout_ms)
    }

    /// Load a configuration from a JSON file
    pub fn from_json_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let config: StoreConfig =
            serde_json::from_str(&raw).map_err(|e| OrdoError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings LMDB cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.path.as_os_str().is_empty() {
            return Err(OrdoError::Config("store path must not be empty".into()));
        }
        if self.map_size == 0 {
            return Err(OrdoError::Config("map_size must be greater than zero".into()));
        }
        if self.max_readers == 0 {
            return Err(OrdoError::Config(
                "max_readers must be greater than zero".into(),
            ));
        }
        if self.max_event_size_bytes == 0 {
            return Err(OrdoError::Config(
                "max_event_size_bytes must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = StoreConfig::new("./data");
        assert_eq!(config.map_size, 1024 * 1024 * 1024);
        assert_eq!(config.max_readers, 126);
        assert_eq!(config.sync_mode, SyncMode::NoMetaSync);
        assert_eq!(config.open_timeout(), Duration::from_secs(1));
        assert_eq!(config.global_entry_mode, GlobalEntryMode::Copy);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_serde_defaults_fill_missing_fields() {
        let config: StoreConfig =
            serde_json::from_str(r#"{"path": "/tmp/ordo", "global_entry_mode": "pointer"}"#)
                .unwrap();
        assert_eq!(config.global_entry_mode, GlobalEntryMode::Pointer);
        assert_eq!(config.open_timeout_ms, 1000);
        assert_eq!(config.max_event_size_bytes, 4 * 1024 * 1024);
    }

    #[test]
    fn test_validate_rejects_zero_map_size() {
        let config = StoreConfig::new("./data").with_map_size(0);
        assert!(matches!(config.validate(), Err(OrdoError::Config(_))));
    }

    #[test]
    fn test_entry_mode_parse() {
        assert_eq!(GlobalEntryMode::parse("copy").unwrap(), GlobalEntryMode::Copy);
        assert_eq!(
            GlobalEntryMode::parse("pointer").unwrap(),
            GlobalEntryMode::Pointer
        );
        assert!(GlobalEntryMode::parse("mirror").is_err());
    }
}
