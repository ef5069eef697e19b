//! Sync-related domain models and configuration.
//!
//! Contains the application configuration, the observable sync state
//! and the notifications a sync cycle emits.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Configuration for remote synchronization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Interval between periodic syncs in seconds.
    #[serde(default = "default_interval")]
    pub interval_secs: u64,

    /// Whether periodic sync runs in `watch` and `shell`.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Remote JSON endpoint (GET snapshot, POST local quotes).
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Whether each sync also pushes the local quotes to the endpoint.
    #[serde(default = "default_push_local")]
    pub push_local: bool,

    /// Maximum remote records mapped per sync (0 = no cap).
    #[serde(default = "default_max_records")]
    pub max_records: usize,

    /// Whether `add` triggers an immediate sync.
    #[serde(default)]
    pub sync_on_add: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval(),
            enabled: default_enabled(),
            endpoint: default_endpoint(),
            push_local: default_push_local(),
            max_records: default_max_records(),
            sync_on_add: false,
        }
    }
}

const fn default_interval() -> u64 {
    30
}

const fn default_enabled() -> bool {
    true
}

fn default_endpoint() -> String {
    "https://jsonplaceholder.typicode.com/posts".to_string()
}

const fn default_push_local() -> bool {
    true
}

const fn default_max_records() -> usize {
    10
}

/// Path configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PathConfig {
    /// Base data directory.
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
}

/// Complete application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    /// Remote sync configuration.
    #[serde(default)]
    pub sync: SyncConfig,

    /// Path configuration.
    #[serde(default)]
    pub paths: PathConfig,
}

impl AppConfig {
    /// Get the data directory, using default if not configured.
    #[must_use]
    pub fn data_dir(&self) -> PathBuf {
        self.paths
            .data_dir
            .clone()
            .unwrap_or_else(Self::default_data_dir)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".quote-keeper")
    }

    /// Get the storage database path.
    #[must_use]
    pub fn storage_db_path(&self) -> PathBuf {
        self.data_dir().join("quotes.db")
    }

    /// Get the config file path.
    #[must_use]
    pub fn config_file_path(&self) -> PathBuf {
        self.data_dir().join("config.toml")
    }
}

/// The two observable phases of the sync state machine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncPhase {
    #[default]
    Idle,
    Syncing,
}

impl std::fmt::Display for SyncPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Syncing => write!(f, "syncing"),
        }
    }
}

/// Current state of synchronization.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncState {
    /// Idle or syncing.
    pub phase: SyncPhase,

    /// Last successful sync timestamp.
    pub last_sync: Option<DateTime<Utc>>,

    /// Number of quotes held after the last successful sync.
    pub quote_count: usize,

    /// Completed sync attempts, successful or not.
    pub attempts: u64,

    /// Last error message if any.
    pub last_error: Option<String>,
}

impl SyncState {
    /// Mark sync as in progress.
    #[must_use]
    pub const fn syncing(mut self) -> Self {
        self.phase = SyncPhase::Syncing;
        self
    }

    /// Mark sync as successfully completed.
    #[must_use]
    pub fn completed(mut self, quote_count: usize) -> Self {
        self.phase = SyncPhase::Idle;
        self.last_sync = Some(Utc::now());
        self.quote_count = quote_count;
        self.attempts += 1;
        self.last_error = None;
        self
    }

    /// Set error state.
    #[must_use]
    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.phase = SyncPhase::Idle;
        self.attempts += 1;
        self.last_error = Some(error.into());
        self
    }

    /// Whether a sync is currently in progress.
    #[must_use]
    pub fn is_syncing(&self) -> bool {
        self.phase == SyncPhase::Syncing
    }
}

/// Kind of user-visible notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    /// Sync merged the remote snapshot.
    Synced,
    /// Remote unreachable; working on local data only.
    Offline,
}

/// A transient message for the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub message: String,
}

impl Notification {
    /// Success notification for a finished merge.
    #[must_use]
    pub fn synced(added: usize, total: usize) -> Self {
        Self {
            kind: NotificationKind::Synced,
            message: format!("Quotes synced with server: {added} new, {total} total"),
        }
    }

    /// Failure notification; local data stays as it was.
    #[must_use]
    pub fn offline(reason: impl std::fmt::Display) -> Self {
        Self {
            kind: NotificationKind::Offline,
            message: format!("Sync failed, working offline ({reason})"),
        }
    }
}
