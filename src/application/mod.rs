//! Application layer - use cases and orchestration.
//!
//! This layer owns the quote store, the sync state machine and the
//! output formatting used by the CLI.

pub mod formatter;
pub mod quote_store;
pub mod sync_service;

pub use formatter::{
    format_categories, format_notification, format_quote, format_quotes, format_status,
    OutputFormat, StoreStatus,
};
pub use quote_store::QuoteStore;
pub use sync_service::{lock_store, SharedStore, SyncOutcome, SyncService};
