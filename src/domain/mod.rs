//! Domain layer - core types and pure functions.
//!
//! This layer contains the quote model, merge rules, configuration and
//! error types without any I/O.

pub mod error;
pub mod models;
pub mod sync;

pub use error::{AppError, ImportError, PersistenceError, Result, SyncError, ValidationError};
pub use models::{
    merge_by_text, remote_to_quotes, seed_quotes, MergeSummary, Quote, RemoteRecord,
    ALL_CATEGORIES,
};
pub use sync::{AppConfig, Notification, NotificationKind, SyncConfig, SyncPhase, SyncState};
