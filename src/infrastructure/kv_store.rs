//! Key-value slot abstraction.
//!
//! Quote state is persisted as plain string values under fixed keys. The
//! durable backend is [`super::LocalStorage`]; [`MemoryStorage`] backs the
//! session slot and tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use crate::domain::Result;

/// A string-to-string slot store.
pub trait KeyValueStore: Send {
    /// Read a value. `Ok(None)` when the key was never written.
    ///
    /// # Errors
    /// Returns error if the backend cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write a value, replacing any prior one.
    ///
    /// # Errors
    /// Returns error if the backend cannot be written.
    fn set(&mut self, key: &str, value: &str) -> Result<()>;

    /// Delete a value. Missing keys are not an error.
    ///
    /// # Errors
    /// Returns error if the backend cannot be written.
    fn remove(&mut self, key: &str) -> Result<()>;
}

/// Process-scoped store. Clones share the same entries.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyValueStore for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_roundtrip() {
        let mut store = MemoryStorage::new();
        assert!(store.get("quotes").unwrap().is_none());

        store.set("quotes", "[]").unwrap();
        assert_eq!(store.get("quotes").unwrap().as_deref(), Some("[]"));

        store.remove("quotes").unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_clones_share_entries() {
        let mut a = MemoryStorage::new();
        let b = a.clone();
        a.set("selectedCategory", "Design").unwrap();
        assert_eq!(b.get("selectedCategory").unwrap().as_deref(), Some("Design"));
    }
}
