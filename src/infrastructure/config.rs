//! Configuration file management.
//!
//! Handles loading and saving TOML configuration files.

use std::fs;
use std::path::{Path, PathBuf};

use crate::domain::{AppConfig, AppError, Result};

/// Default configuration file content.
const DEFAULT_CONFIG: &str = r#"# Quote Keeper Configuration
# Auto-generated - edit as needed

[sync]
# Interval between background syncs in seconds (default: 30)
interval_secs = 30

# Whether background sync runs in `watch` and `shell`
enabled = true

# Remote JSON endpoint: GET returns records with a `title`, POST receives local quotes
endpoint = "https://jsonplaceholder.typicode.com/posts"

# Push the local quotes to the endpoint on every sync
push_local = true

# Maximum remote records merged per sync (0 = all)
max_records = 10

# Sync right after every `add`
sync_on_add = false

[paths]
# Custom data directory (optional, defaults to ~/.quote-keeper)
# data_dir = "/custom/path"
"#;

/// Load configuration from the default location or fall back to defaults.
///
/// # Errors
/// Returns error if file exists but cannot be read or parsed.
pub fn load_config() -> Result<AppConfig> {
    let config_path = config_file_path();

    if config_path.exists() {
        load_config_from_file(&config_path)
    } else {
        tracing::debug!(path = %config_path.display(), "No config file, using defaults");
        Ok(AppConfig::default())
    }
}

/// Load configuration from a specific file.
///
/// # Errors
/// Returns error if file cannot be read or parsed.
pub fn load_config_from_file(path: &Path) -> Result<AppConfig> {
    let content = fs::read_to_string(path)
        .map_err(|e| AppError::io(format!("Failed to read config file: {}", path.display()), e))?;

    toml::from_str(&content).map_err(|e| AppError::Config {
        message: format!("Failed to parse config file: {e}"),
    })
}

/// Save configuration to file.
///
/// # Errors
/// Returns error if file cannot be written.
pub fn save_config(config: &AppConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| AppError::io("Failed to create config directory", e))?;
    }

    let content = toml::to_string_pretty(config).map_err(|e| AppError::Config {
        message: format!("Failed to serialize config: {e}"),
    })?;

    fs::write(path, content)
        .map_err(|e| AppError::io(format!("Failed to write config file: {}", path.display()), e))?;

    tracing::info!(path = %path.display(), "Configuration saved");

    Ok(())
}

/// Create the commented default configuration file if it doesn't exist.
///
/// Returns `true` when a file was written.
///
/// # Errors
/// Returns error if file cannot be created.
pub fn ensure_config_exists(path: &Path) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| AppError::io("Failed to create config directory", e))?;
    }

    fs::write(path, DEFAULT_CONFIG)
        .map_err(|e| AppError::io("Failed to create default config", e))?;

    tracing::info!(path = %path.display(), "Created default configuration");

    Ok(true)
}

/// Get the path to the default configuration file.
#[must_use]
pub fn config_file_path() -> PathBuf {
    AppConfig::default().config_file_path()
}
