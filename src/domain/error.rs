//! Domain-level error types for quote-keeper.
//!
//! All errors are typed with `thiserror`. Only `AppError` ever reaches the
//! user as a hard failure; persistence and sync errors are logged or turned
//! into notifications by the application layer.

use thiserror::Error;

/// Rejected input on a single quote add.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    /// Quote text is empty after trimming.
    #[error("Please enter a quote text")]
    EmptyText,

    /// Category is empty after trimming.
    #[error("Please enter a category")]
    EmptyCategory,
}

/// Malformed import payload. No partial import happens on any variant.
#[derive(Error, Debug)]
pub enum ImportError {
    /// Payload is not valid JSON at all.
    #[error("Import file is not valid JSON: {0}")]
    Parse(#[source] serde_json::Error),

    /// Payload decoded, but not to an array.
    #[error("Import file must contain a JSON array of quotes")]
    NotAnArray,

    /// An element lacks a string `text` or `category`.
    #[error("Invalid quote at position {index}: expected string `text` and `category`")]
    InvalidShape { index: usize },
}

/// Failure to write state to the durable key-value slots.
#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("Failed to serialize quotes: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Storage write failed: {message}")]
    Storage { message: String },
}

/// Remote endpoint unreachable or returned something unusable.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Remote request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Remote returned HTTP status {0}")]
    HttpStatus(u16),

    #[error("Remote response could not be decoded: {message}")]
    Decode { message: String },
}

/// Application-level errors surfaced by the CLI.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Import(#[from] ImportError),

    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),

    #[error("Sync error: {0}")]
    Sync(#[from] SyncError),

    /// Failed to open or query the database.
    #[error("Database error: {message}")]
    Database {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// JSON (de)serialization failed.
    #[error("JSON error: {message}")]
    JsonParse {
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    /// Configuration or environment error.
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// IO operation failed.
    #[error("IO error: {message}")]
    Io {
        message: String,
        #[source]
        source: Option<std::io::Error>,
    },
}

impl AppError {
    /// Create a database error from rusqlite error.
    pub fn database(err: rusqlite::Error) -> Self {
        Self::Database {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }

    /// Create a JSON error.
    pub fn json_parse(err: serde_json::Error) -> Self {
        Self::JsonParse {
            message: err.to_string(),
            source: Some(err),
        }
    }

    /// Create an IO error with context.
    pub fn io(message: impl Into<String>, err: std::io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source: Some(err),
        }
    }
}

impl From<AppError> for PersistenceError {
    fn from(err: AppError) -> Self {
        match err {
            AppError::Persistence(inner) => inner,
            other => Self::Storage {
                message: other.to_string(),
            },
        }
    }
}

/// Result type alias using `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_messages() {
        assert_eq!(
            ValidationError::EmptyText.to_string(),
            "Please enter a quote text"
        );
        let err: AppError = ValidationError::EmptyCategory.into();
        assert_eq!(err.to_string(), "Please enter a category");
    }

    #[test]
    fn test_import_error_shape_message() {
        let err = ImportError::InvalidShape { index: 3 };
        assert!(err.to_string().contains("position 3"));
    }

    #[test]
    fn test_app_error_into_persistence() {
        let err = AppError::Config {
            message: "boom".into(),
        };
        let persisted: PersistenceError = err.into();
        assert!(matches!(persisted, PersistenceError::Storage { .. }));
    }
}
