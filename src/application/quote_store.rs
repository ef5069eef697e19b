//! The authoritative in-memory quote list.
//!
//! `QuoteStore` owns the ordered quote sequence and the selected category,
//! and flushes both to durable key-value slots on every mutation. Storage
//! failures are logged and never undo the in-memory change.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::domain::{
    merge_by_text, seed_quotes, ImportError, MergeSummary, PersistenceError, Quote, Result,
    ValidationError, ALL_CATEGORIES,
};
use crate::infrastructure::KeyValueStore;

/// Durable slot holding the JSON quote array.
pub const QUOTES_KEY: &str = "quotes";
/// Durable slot holding the selected category.
pub const FILTER_KEY: &str = "selectedCategory";
/// Session slot holding the last displayed quote.
pub const LAST_VIEWED_KEY: &str = "lastViewedQuote";

/// Quote list with persistence, filtering and random selection.
pub struct QuoteStore {
    quotes: Vec<Quote>,
    filter: String,
    storage: Box<dyn KeyValueStore>,
    session: Box<dyn KeyValueStore>,
}

impl QuoteStore {
    /// Build the store from persisted state, falling back to the seed list.
    #[must_use]
    pub fn open(storage: Box<dyn KeyValueStore>, session: Box<dyn KeyValueStore>) -> Self {
        let quotes = Self::load(storage.as_ref());

        let filter = match storage.get(FILTER_KEY) {
            Ok(Some(value)) => value,
            Ok(None) => ALL_CATEGORIES.to_string(),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read selected category, showing all");
                ALL_CATEGORIES.to_string()
            }
        };

        tracing::debug!(count = quotes.len(), filter = %filter, "Quote store opened");

        Self {
            quotes,
            filter,
            storage,
            session,
        }
    }

    /// Read the persisted quote list.
    ///
    /// Absent, unreadable and unparseable values all yield the seed list.
    /// Stored records with a blank field are dropped.
    #[must_use]
    pub fn load(storage: &dyn KeyValueStore) -> Vec<Quote> {
        let raw = match storage.get(QUOTES_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                tracing::debug!("No stored quotes, using seed list");
                return seed_quotes();
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read stored quotes, using seed list");
                return seed_quotes();
            }
        };

        match serde_json::from_str::<Vec<Quote>>(&raw) {
            Ok(stored) => {
                let total = stored.len();
                let quotes: Vec<Quote> = stored.into_iter().filter(Quote::is_valid).collect();
                if quotes.len() < total {
                    tracing::warn!(
                        dropped = total - quotes.len(),
                        "Ignoring stored quotes with empty text or category"
                    );
                }
                quotes
            }
            Err(e) => {
                tracing::warn!(error = %e, "Stored quotes are corrupted, using seed list");
                seed_quotes()
            }
        }
    }

    /// Write the full sequence to the `quotes` slot. Failures are logged only.
    pub fn persist(&mut self) {
        if let Err(e) = self.try_persist() {
            tracing::warn!(error = %e, "Failed to save quotes; keeping in-memory state");
        }
    }

    fn try_persist(&mut self) -> std::result::Result<(), PersistenceError> {
        let json = serde_json::to_string(&self.quotes)?;
        self.storage.set(QUOTES_KEY, &json)?;
        tracing::debug!(count = self.quotes.len(), "Quotes saved");
        Ok(())
    }

    /// Append a quote from raw form input.
    ///
    /// # Errors
    /// Returns `ValidationError` if either field is blank; nothing changes.
    pub fn add(
        &mut self,
        text: &str,
        category: &str,
    ) -> std::result::Result<Quote, ValidationError> {
        let quote = Quote::new(text, category)?;
        self.quotes.push(quote.clone());
        self.persist();

        tracing::info!(category = %quote.category, "Quote added");
        Ok(quote)
    }

    /// Append externally supplied records after validating all of them.
    ///
    /// Records are not deduplicated against existing quotes.
    ///
    /// # Errors
    /// `NotAnArray` for non-array input, `InvalidShape` for the first element
    /// without string `text` and `category`. No partial import happens.
    pub fn import_many(
        &mut self,
        raw: serde_json::Value,
    ) -> std::result::Result<usize, ImportError> {
        let serde_json::Value::Array(items) = raw else {
            return Err(ImportError::NotAnArray);
        };

        let mut imported = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            let text = item.get("text").and_then(serde_json::Value::as_str);
            let category = item.get("category").and_then(serde_json::Value::as_str);

            match (text, category) {
                (Some(text), Some(category)) => {
                    let quote = Quote {
                        text: text.to_string(),
                        category: category.to_string(),
                    };
                    if !quote.is_valid() {
                        return Err(ImportError::InvalidShape { index });
                    }
                    imported.push(quote);
                }
                _ => return Err(ImportError::InvalidShape { index }),
            }
        }

        let count = imported.len();
        self.quotes.extend(imported);
        self.persist();

        tracing::info!(count, "Quotes imported");
        Ok(count)
    }

    /// Parse raw file content and import it.
    ///
    /// # Errors
    /// `ImportError::Parse` when the content is not JSON, otherwise as
    /// [`Self::import_many`].
    pub fn import_json(&mut self, content: &str) -> std::result::Result<usize, ImportError> {
        let raw: serde_json::Value = serde_json::from_str(content).map_err(ImportError::Parse)?;
        self.import_many(raw)
    }

    /// Serialize every quote as pretty JSON with 2-space indentation.
    ///
    /// # Errors
    /// Returns error if serialization fails.
    pub fn export_all(&self) -> Result<Vec<u8>> {
        serde_json::to_vec_pretty(&self.quotes).map_err(crate::domain::AppError::json_parse)
    }

    /// Store the selected category. Unknown categories are accepted.
    pub fn set_filter(&mut self, category: impl Into<String>) {
        self.filter = category.into();
        if let Err(e) = self.storage.set(FILTER_KEY, &self.filter) {
            tracing::warn!(error = %e, "Failed to save selected category");
        }
    }

    /// The selected category, `"all"` by default.
    #[must_use]
    pub fn filter(&self) -> &str {
        &self.filter
    }

    /// `"all"` followed by each distinct category in first-occurrence order.
    #[must_use]
    pub fn categories(&self) -> Vec<String> {
        let mut categories = vec![ALL_CATEGORIES.to_string()];
        for quote in &self.quotes {
            if !categories.contains(&quote.category) {
                categories.push(quote.category.clone());
            }
        }
        categories
    }

    /// Quotes matching the selected category, in original order.
    #[must_use]
    pub fn filtered(&self) -> Vec<&Quote> {
        if self.filter == ALL_CATEGORIES {
            return self.quotes.iter().collect();
        }

        self.quotes
            .iter()
            .filter(|q| q.category == self.filter)
            .collect()
    }

    /// Pick a uniformly random quote from the filtered set and remember it
    /// as last viewed. `None` when nothing matches.
    pub fn pick_random(&mut self) -> Option<Quote> {
        let picked = self.choose_with(&mut rand::thread_rng(), None)?;
        self.remember_viewed(&picked);
        Some(picked)
    }

    /// Like [`Self::pick_random`], but never repeats the last viewed quote
    /// while another candidate exists.
    pub fn pick_fresh(&mut self) -> Option<Quote> {
        let previous = self.last_viewed();
        let picked = self.choose_with(&mut rand::thread_rng(), previous.as_ref())?;
        self.remember_viewed(&picked);
        Some(picked)
    }

    fn choose_with<R: Rng + ?Sized>(&self, rng: &mut R, avoid: Option<&Quote>) -> Option<Quote> {
        let candidates = self.filtered();
        let pool: Vec<&Quote> = match avoid {
            Some(previous) if candidates.len() > 1 => {
                let rest: Vec<&Quote> = candidates
                    .iter()
                    .copied()
                    .filter(|q| *q != previous)
                    .collect();
                if rest.is_empty() {
                    candidates
                } else {
                    rest
                }
            }
            _ => candidates,
        };

        pool.choose(rng).map(|q| (*q).clone())
    }

    fn remember_viewed(&mut self, quote: &Quote) {
        match serde_json::to_string(quote) {
            Ok(json) => {
                if let Err(e) = self.session.set(LAST_VIEWED_KEY, &json) {
                    tracing::warn!(error = %e, "Failed to record last viewed quote");
                }
            }
            Err(e) => tracing::warn!(error = %e, "Failed to serialize last viewed quote"),
        }
    }

    /// The most recently displayed quote in this session.
    #[must_use]
    pub fn last_viewed(&self) -> Option<Quote> {
        let raw = self.session.get(LAST_VIEWED_KEY).ok().flatten()?;
        serde_json::from_str(&raw).ok()
    }

    /// Merge a fetched remote snapshot into the local list and persist.
    ///
    /// Local quotes come first; the first quote seen for each text is kept.
    pub fn apply_remote(&mut self, fetched: Vec<Quote>) -> MergeSummary {
        let before = self.quotes.len();
        let fetched_count = fetched.len();

        let (merged, added) = merge_by_text(&self.quotes, fetched);
        self.quotes = merged;
        self.persist();

        MergeSummary {
            before,
            after: self.quotes.len(),
            fetched: fetched_count,
            added,
        }
    }

    /// All quotes in insertion order.
    #[must_use]
    pub fn quotes(&self) -> &[Quote] {
        &self.quotes
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.quotes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::AppError;
    use crate::infrastructure::{LocalStorage, MemoryStorage};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    /// Store whose writes always fail.
    struct BrokenStorage;

    impl KeyValueStore for BrokenStorage {
        fn get(&self, _key: &str) -> Result<Option<String>> {
            Ok(None)
        }

        fn set(&mut self, _key: &str, _value: &str) -> Result<()> {
            Err(AppError::Config {
                message: "disk full".into(),
            })
        }

        fn remove(&mut self, _key: &str) -> Result<()> {
            Ok(())
        }
    }

    fn quote(text: &str, category: &str) -> Quote {
        Quote {
            text: text.into(),
            category: category.into(),
        }
    }

    fn store_with(storage: MemoryStorage) -> QuoteStore {
        QuoteStore::open(Box::new(storage), Box::new(MemoryStorage::new()))
    }

    fn empty_store() -> (QuoteStore, MemoryStorage) {
        let mut storage = MemoryStorage::new();
        storage.set(QUOTES_KEY, "[]").unwrap();
        (store_with(storage.clone()), storage)
    }

    #[test]
    fn test_missing_key_loads_seed() {
        let store = store_with(MemoryStorage::new());
        assert_eq!(store.len(), 3);
        assert_eq!(store.quotes(), seed_quotes().as_slice());
        assert_eq!(store.filter(), "all");
    }

    #[test]
    fn test_corrupted_value_loads_seed() {
        let mut storage = MemoryStorage::new();
        storage.set(QUOTES_KEY, "{not json").unwrap();
        assert_eq!(QuoteStore::load(&storage), seed_quotes());
    }

    #[test]
    fn test_load_drops_blank_records() {
        let mut storage = MemoryStorage::new();
        storage
            .set(
                QUOTES_KEY,
                r#"[{"text":"ok","category":"A"},{"text":"  ","category":"B"}]"#,
            )
            .unwrap();
        assert_eq!(QuoteStore::load(&storage), vec![quote("ok", "A")]);
    }

    #[test]
    fn test_add_appends_trimmed_and_persists() {
        let (mut store, storage) = empty_store();

        let added = store.add("  Be kind ", " Life  ").unwrap();

        assert_eq!(added, quote("Be kind", "Life"));
        assert_eq!(store.len(), 1);
        assert_eq!(store.quotes().last(), Some(&added));

        let reopened = store_with(storage);
        assert_eq!(reopened.quotes(), &[quote("Be kind", "Life")]);
    }

    #[test]
    fn test_add_rejects_blank_without_change() {
        let mut store = store_with(MemoryStorage::new());

        for (text, category) in [("", "A"), ("  ", "A"), ("text", ""), ("text", " \n")] {
            assert!(store.add(text, category).is_err());
        }
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn test_persist_failure_keeps_memory() {
        let mut store = QuoteStore::open(Box::new(BrokenStorage), Box::new(MemoryStorage::new()));
        store.add("Still here", "Life").unwrap();
        store.set_filter("Life");

        assert_eq!(store.len(), 4);
        assert_eq!(store.filter(), "Life");
    }

    #[test]
    fn test_import_many_appends_without_dedup() {
        let mut store = store_with(MemoryStorage::new());
        let raw = serde_json::json!([
            {"text": "Simplicity is the soul of efficiency.", "category": "Design"},
            {"text": "New", "category": "Misc", "extra": 1}
        ]);

        assert_eq!(store.import_many(raw).unwrap(), 2);
        assert_eq!(store.len(), 5);
        assert_eq!(store.quotes()[4], quote("New", "Misc"));
    }

    #[test]
    fn test_import_not_an_array() {
        let mut store = store_with(MemoryStorage::new());
        let result = store.import_many(serde_json::json!({"text": "a", "category": "b"}));
        assert!(matches!(result, Err(ImportError::NotAnArray)));
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn test_import_invalid_shape_is_all_or_nothing() {
        let mut store = store_with(MemoryStorage::new());
        let raw = serde_json::json!([
            {"text": "fine", "category": "A"},
            {"text": 42, "category": "A"}
        ]);

        let result = store.import_many(raw);
        assert!(matches!(result, Err(ImportError::InvalidShape { index: 1 })));
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn test_import_missing_field() {
        let mut store = store_with(MemoryStorage::new());
        let result = store.import_many(serde_json::json!([{"text": "no category"}]));
        assert!(matches!(result, Err(ImportError::InvalidShape { index: 0 })));
    }

    #[test]
    fn test_import_not_json() {
        let mut store = store_with(MemoryStorage::new());
        let result = store.import_json("not json");
        assert!(matches!(result, Err(ImportError::Parse(_))));
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn test_export_format() {
        let (mut store, _) = empty_store();
        store.add("a", "b").unwrap();

        let exported = String::from_utf8(store.export_all().unwrap()).unwrap();
        assert_eq!(
            exported,
            "[\n  {\n    \"text\": \"a\",\n    \"category\": \"b\"\n  }\n]"
        );
        assert_eq!(exported.as_bytes(), store.export_all().unwrap().as_slice());
    }

    #[test]
    fn test_export_import_roundtrip() {
        let source = store_with(MemoryStorage::new());
        let exported = source.export_all().unwrap();

        let (mut target, _) = empty_store();
        let content = String::from_utf8(exported).unwrap();
        target.import_json(&content).unwrap();

        assert_eq!(target.quotes(), source.quotes());
    }

    #[test]
    fn test_categories_first_occurrence_order() {
        let (mut store, _) = empty_store();
        store.add("1", "B").unwrap();
        store.add("2", "A").unwrap();
        store.add("3", "B").unwrap();
        store.add("4", "all").unwrap();

        let categories = store.categories();
        assert_eq!(categories, vec!["all", "B", "A"]);
    }

    #[test]
    fn test_categories_unique_for_seed() {
        let store = store_with(MemoryStorage::new());
        let categories = store.categories();
        let unique: HashSet<_> = categories.iter().collect();
        assert_eq!(unique.len(), categories.len());
        assert_eq!(categories, vec!["all", "Inspiration", "Programming", "Design"]);
    }

    #[test]
    fn test_filtered_all_and_exact_match() {
        let (mut store, _) = empty_store();
        store.add("1", "A").unwrap();
        store.add("2", "B").unwrap();
        store.add("3", "A").unwrap();

        assert_eq!(store.filtered().len(), 3);

        store.set_filter("A");
        let texts: Vec<_> = store.filtered().iter().map(|q| q.text.as_str()).collect();
        assert_eq!(texts, ["1", "3"]);

        store.set_filter("a");
        assert!(store.filtered().is_empty());
    }

    #[test]
    fn test_stale_filter_is_persisted_and_empty() {
        let storage = MemoryStorage::new();
        let mut store = store_with(storage.clone());
        store.set_filter("Gone");

        let mut reopened = store_with(storage);
        assert_eq!(reopened.filter(), "Gone");
        assert!(reopened.filtered().is_empty());
        assert!(reopened.pick_random().is_none());
    }

    #[test]
    fn test_pick_random_records_last_viewed() {
        let mut store = store_with(MemoryStorage::new());
        assert!(store.last_viewed().is_none());

        let picked = store.pick_random().unwrap();
        assert!(store.quotes().contains(&picked));
        assert_eq!(store.last_viewed(), Some(picked));
    }

    #[test]
    fn test_pick_random_respects_filter() {
        let mut store = store_with(MemoryStorage::new());
        store.set_filter("Design");
        for _ in 0..20 {
            assert_eq!(store.pick_random().unwrap().category, "Design");
        }
    }

    #[test]
    fn test_choose_covers_all_candidates() {
        let store = store_with(MemoryStorage::new());
        let mut rng = StdRng::seed_from_u64(7);
        let seen: HashSet<_> = (0..200)
            .filter_map(|_| store.choose_with(&mut rng, None))
            .map(|q| q.text)
            .collect();
        assert_eq!(seen.len(), 3);
    }

    #[test]
    fn test_pick_fresh_avoids_repeat() {
        let mut store = store_with(MemoryStorage::new());
        let mut previous = store.pick_fresh().unwrap();
        for _ in 0..20 {
            let next = store.pick_fresh().unwrap();
            assert_ne!(next, previous);
            previous = next;
        }
    }

    #[test]
    fn test_pick_fresh_single_candidate_repeats() {
        let mut store = store_with(MemoryStorage::new());
        store.set_filter("Design");
        let first = store.pick_fresh().unwrap();
        assert_eq!(store.pick_fresh(), Some(first));
    }

    #[test]
    fn test_apply_remote_merges_and_persists() {
        let (mut store, storage) = empty_store();
        store.add("Be kind", "A").unwrap();

        let summary = store.apply_remote(vec![
            quote("Be kind", "Server"),
            quote("New one", "Fetched"),
        ]);

        assert_eq!(
            store.quotes(),
            &[quote("Be kind", "A"), quote("New one", "Fetched")]
        );
        assert_eq!(summary.added, 1);
        assert_eq!(summary.fetched, 2);
        assert_eq!(QuoteStore::load(&storage).len(), 2);
    }

    #[test]
    fn test_works_on_sqlite_storage() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("quotes.db");

        {
            let storage = LocalStorage::open(&db_path).unwrap();
            let mut store = QuoteStore::open(Box::new(storage), Box::new(MemoryStorage::new()));
            store.add("Persisted", "Disk").unwrap();
            store.set_filter("Disk");
        }

        let storage = LocalStorage::open(&db_path).unwrap();
        let store = QuoteStore::open(Box::new(storage), Box::new(MemoryStorage::new()));
        assert_eq!(store.len(), 4);
        assert_eq!(store.filter(), "Disk");
        assert_eq!(store.filtered().len(), 1);
    }
}
