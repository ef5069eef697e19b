//! Synchronization service for quote data.
//!
//! Reconciles the local quote list with a remote snapshot, on demand or on
//! a fixed interval. At most one sync runs at a time; a request made while
//! one is in flight is dropped, not queued.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::domain::{
    remote_to_quotes, MergeSummary, Notification, SyncConfig, SyncError, SyncPhase, SyncState,
};
use crate::infrastructure::RemoteSource;

use super::quote_store::QuoteStore;

/// Quote store shared between the presentation layer and the sync task.
pub type SharedStore = Arc<Mutex<QuoteStore>>;

/// Lock the shared store, recovering from a poisoned lock.
///
/// The guard must never be held across an `.await`.
pub fn lock_store(store: &Mutex<QuoteStore>) -> MutexGuard<'_, QuoteStore> {
    store.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Result of a single `sync_now` call.
#[derive(Debug)]
pub enum SyncOutcome {
    /// Another sync was in flight; nothing happened.
    Skipped,
    /// Remote snapshot merged and persisted.
    Synced(MergeSummary),
    /// Remote read failed; local quotes untouched.
    Failed(SyncError),
}

/// Holds the syncing flag for the lifetime of one sync.
struct SyncGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> SyncGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for SyncGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Service for synchronizing quotes with the remote endpoint.
pub struct SyncService {
    store: SharedStore,
    remote: Arc<dyn RemoteSource>,
    config: SyncConfig,
    syncing: AtomicBool,
    state: Mutex<SyncState>,
    notifier: Option<mpsc::UnboundedSender<Notification>>,
}

impl SyncService {
    /// Create a new sync service over a shared store.
    #[must_use]
    pub fn new(store: SharedStore, remote: Arc<dyn RemoteSource>, config: SyncConfig) -> Self {
        Self {
            store,
            remote,
            config,
            syncing: AtomicBool::new(false),
            state: Mutex::new(SyncState::default()),
            notifier: None,
        }
    }

    /// Send notifications to the given channel.
    #[must_use]
    pub fn with_notifier(mut self, tx: mpsc::UnboundedSender<Notification>) -> Self {
        self.notifier = Some(tx);
        self
    }

    /// The store this service merges into.
    #[must_use]
    pub const fn store(&self) -> &SharedStore {
        &self.store
    }

    /// Whether a sync is in flight right now.
    #[must_use]
    pub fn phase(&self) -> SyncPhase {
        if self.syncing.load(Ordering::Acquire) {
            SyncPhase::Syncing
        } else {
            SyncPhase::Idle
        }
    }

    /// Snapshot of the sync state.
    #[must_use]
    pub fn state(&self) -> SyncState {
        let mut state = self
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        state.phase = self.phase();
        state
    }

    fn update_state(&self, f: impl FnOnce(SyncState) -> SyncState) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        *state = f(state.clone());
    }

    fn notify(&self, notification: Notification) {
        if let Some(tx) = &self.notifier {
            if tx.send(notification).is_err() {
                tracing::debug!("Notification receiver dropped");
            }
        }
    }

    /// Run one sync cycle unless one is already in flight.
    pub async fn sync_now(&self) -> SyncOutcome {
        let Some(_guard) = SyncGuard::acquire(&self.syncing) else {
            tracing::debug!("Sync already in progress, request dropped");
            return SyncOutcome::Skipped;
        };

        self.update_state(SyncState::syncing);
        tracing::info!("Starting sync...");
        let start = std::time::Instant::now();

        let records = match self.remote.fetch_records().await {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!(error = %e, "Sync failed, keeping local quotes");
                self.update_state(|s| s.with_error(e.to_string()));
                self.notify(Notification::offline(&e));
                return SyncOutcome::Failed(e);
            }
        };

        if self.config.push_local {
            let snapshot = lock_store(&self.store).quotes().to_vec();
            match self.remote.push_quotes(&snapshot).await {
                Ok(()) => tracing::debug!(count = snapshot.len(), "Pushed local quotes"),
                Err(e) => tracing::debug!(error = %e, "Push of local quotes failed, ignoring"),
            }
        }

        let fetched = remote_to_quotes(records, self.config.max_records);
        let summary = lock_store(&self.store).apply_remote(fetched);

        tracing::info!(
            fetched = summary.fetched,
            added = summary.added,
            total = summary.after,
            duration_ms = start.elapsed().as_millis(),
            "Sync completed"
        );

        self.update_state(|s| s.completed(summary.after));
        self.notify(Notification::synced(summary.added, summary.after));

        SyncOutcome::Synced(summary)
    }

    /// Sync after a quote was added, if `sync_on_add` is set.
    pub async fn sync_after_add(&self) -> Option<SyncOutcome> {
        if !self.config.sync_on_add {
            return None;
        }
        Some(self.sync_now().await)
    }

    /// Sync every `interval_secs`, forever. The first sync happens one
    /// interval after the call. Failures never stop or slow the timer.
    pub async fn run_periodic(&self) {
        let period = Duration::from_secs(self.config.interval_secs.max(1));
        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!(interval_secs = period.as_secs(), "Periodic sync started");

        loop {
            ticker.tick().await;
            let _ = self.sync_now().await;
        }
    }

    /// Spawn [`Self::run_periodic`] on the runtime.
    #[must_use]
    pub fn spawn_periodic(self: &Arc<Self>) -> JoinHandle<()> {
        let service = Arc::clone(self);
        tokio::spawn(async move { service.run_periodic().await })
    }
}
