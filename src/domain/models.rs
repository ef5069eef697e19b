//! Domain models for quotes.
//!
//! A quote is a `{text, category}` pair with no identifier. Equality for
//! merging is exact `text` match.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::error::ValidationError;

/// Filter value that matches every category.
pub const ALL_CATEGORIES: &str = "all";

/// Categories assigned to remote records, alternating by position.
pub const REMOTE_CATEGORY_LABELS: [&str; 2] = ["Server", "Fetched"];

/// A single quote.
///
/// Field order is the serialized key order (`text`, then `category`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Quote {
    /// The quote itself.
    pub text: String,
    /// Free-form category label.
    pub category: String,
}

impl Quote {
    /// Build a quote from raw user input, trimming both fields.
    ///
    /// # Errors
    /// Returns `ValidationError` if either field is empty after trimming.
    pub fn new(text: &str, category: &str) -> Result<Self, ValidationError> {
        let text = text.trim();
        let category = category.trim();

        if text.is_empty() {
            return Err(ValidationError::EmptyText);
        }
        if category.is_empty() {
            return Err(ValidationError::EmptyCategory);
        }

        Ok(Self {
            text: text.to_string(),
            category: category.to_string(),
        })
    }

    /// Whether both fields hold something other than whitespace.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        !self.text.trim().is_empty() && !self.category.trim().is_empty()
    }
}

impl std::fmt::Display for Quote {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "\"{}\" ({})", self.text, self.category)
    }
}

/// Fixed list used when nothing has been persisted yet.
#[must_use]
pub fn seed_quotes() -> Vec<Quote> {
    [
        (
            "The best way to predict the future is to invent it.",
            "Inspiration",
        ),
        (
            "Code is like humor. When you have to explain it, it’s bad.",
            "Programming",
        ),
        ("Simplicity is the soul of efficiency.", "Design"),
    ]
    .into_iter()
    .map(|(text, category)| Quote {
        text: text.to_string(),
        category: category.to_string(),
    })
    .collect()
}

/// A record as returned by the remote endpoint.
///
/// Only `title` is read; every other field is ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteRecord {
    pub title: String,
}

/// Map remote records to quotes.
///
/// The remote carries no category, so one is assigned by position from
/// [`REMOTE_CATEGORY_LABELS`]. `limit` of zero keeps every record.
/// Records with a blank title are skipped but still count for position.
#[must_use]
pub fn remote_to_quotes(records: Vec<RemoteRecord>, limit: usize) -> Vec<Quote> {
    let take = if limit == 0 { usize::MAX } else { limit };

    records
        .into_iter()
        .take(take)
        .enumerate()
        .map(|(index, record)| Quote {
            text: record.title,
            category: REMOTE_CATEGORY_LABELS[index % REMOTE_CATEGORY_LABELS.len()].to_string(),
        })
        .filter(Quote::is_valid)
        .collect()
}

/// Concatenate `local` then `remote` and keep the first quote for each text.
///
/// Local quotes win on collision. Duplicates already present in `local`
/// collapse as well. Returns the merged list and how many remote quotes
/// made it in.
#[must_use]
pub fn merge_by_text(local: &[Quote], remote: Vec<Quote>) -> (Vec<Quote>, usize) {
    let mut seen: HashSet<String> = HashSet::with_capacity(local.len() + remote.len());
    let mut merged = Vec::with_capacity(local.len() + remote.len());

    for quote in local {
        if seen.insert(quote.text.clone()) {
            merged.push(quote.clone());
        }
    }

    let mut added = 0;
    for quote in remote {
        if seen.insert(quote.text.clone()) {
            merged.push(quote);
            added += 1;
        }
    }

    (merged, added)
}

/// Counts describing what a merge changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeSummary {
    /// Quotes held before the merge.
    pub before: usize,
    /// Quotes held after the merge.
    pub after: usize,
    /// Remote records considered.
    pub fetched: usize,
    /// Remote quotes that were new locally.
    pub added: usize,
}
