//! # Catalog Sync
//!
//! Keeps the [`CollectionStore`] in step with the backend.
//!
//! ## Overview
//!
//! Every reload replaces the whole collection; there is no diffing. Each
//! reload takes a generation number when it starts, and a response is only
//! applied if its generation is still the latest when it arrives. Overlapping
//! reloads (for example two mutations finishing close together) therefore
//! settle on the most recently *issued* fetch, not the last one to complete.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use core_sync::{CatalogSync, ReloadOutcome};
//!
//! # async fn example(sync: CatalogSync) {
//! match sync.reload().await {
//!     ReloadOutcome::Applied { count, .. } => println!("{} books", count),
//!     ReloadOutcome::Stale { .. } => {}
//!     ReloadOutcome::Failed { error, .. } => eprintln!("{}", error),
//! }
//! # }
//! ```

use crate::api::{CatalogApi, SearchQuery};
use crate::SyncError;
use core_auth::ApiResult;
use core_library::{Book, CollectionStore};
use core_runtime::events::{CatalogEvent, CoreEvent, EventBus};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

/// What happened to one reload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReloadOutcome {
    /// The response replaced the collection.
    Applied { generation: u64, count: usize },
    /// A newer reload was issued before this one's response arrived.
    Stale { generation: u64, latest: u64 },
    /// The fetch failed; the previous collection is kept.
    Failed { generation: u64, error: SyncError },
}

impl ReloadOutcome {
    pub fn generation(&self) -> u64 {
        match self {
            ReloadOutcome::Applied { generation, .. }
            | ReloadOutcome::Stale { generation, .. }
            | ReloadOutcome::Failed { generation, .. } => *generation,
        }
    }

    pub fn is_applied(&self) -> bool {
        matches!(self, ReloadOutcome::Applied { .. })
    }

    pub fn error(&self) -> Option<&SyncError> {
        match self {
            ReloadOutcome::Failed { error, .. } => Some(error),
            _ => None,
        }
    }
}

/// Monotonic fetch counter plus the lock that makes "check latest, then
/// replace" a single step.
#[derive(Debug, Default)]
pub(crate) struct Generations {
    latest: AtomicU64,
    apply: Mutex<()>,
}

impl Generations {
    pub(crate) fn begin(&self) -> u64 {
        self.latest.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub(crate) fn latest(&self) -> u64 {
        self.latest.load(Ordering::SeqCst)
    }

    /// Run `apply` only if `generation` is still the latest.
    ///
    /// Returns `Err(latest)` when the generation is stale.
    pub(crate) async fn apply_if_latest<F, Fut, T>(&self, generation: u64, apply: F) -> Result<T, u64>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = T>,
    {
        let _guard = self.apply.lock().await;
        let latest = self.latest();
        if generation != latest {
            return Err(latest);
        }
        Ok(apply().await)
    }
}

/// Generation-guarded reloads of the book collection.
#[derive(Clone)]
pub struct CatalogSync {
    api: Arc<dyn CatalogApi>,
    store: CollectionStore,
    event_bus: EventBus,
    generations: Arc<Generations>,
}

impl CatalogSync {
    pub fn new(api: Arc<dyn CatalogApi>, store: CollectionStore, event_bus: EventBus) -> Self {
        Self {
            api,
            store,
            event_bus,
            generations: Arc::new(Generations::default()),
        }
    }

    pub fn store(&self) -> &CollectionStore {
        &self.store
    }

    pub fn api(&self) -> &Arc<dyn CatalogApi> {
        &self.api
    }

    /// Generation of the most recently issued reload, `0` before the first.
    pub fn latest_generation(&self) -> u64 {
        self.generations.latest()
    }

    /// Fetch the full collection.
    pub async fn reload(&self) -> ReloadOutcome {
        self.reload_matching(&SearchQuery::default()).await
    }

    /// Fetch with server-side narrowing. The result still replaces the whole
    /// collection.
    #[instrument(skip(self, query), fields(path = %query.path()))]
    pub async fn reload_matching(&self, query: &SearchQuery) -> ReloadOutcome {
        let generation = self.begin();
        let result = self.api.search_books(query).await;
        self.complete(generation, result).await
    }

    /// Take the next generation number and announce the fetch.
    pub fn begin(&self) -> u64 {
        let generation = self.generations.begin();
        debug!(generation, "Reload started");
        self.emit(CatalogEvent::ReloadStarted { generation });
        generation
    }

    /// Apply the response of fetch `generation`, unless a newer one was issued.
    pub async fn complete(&self, generation: u64, result: ApiResult<Vec<Book>>) -> ReloadOutcome {
        let outcome = match result {
            Ok(books) => {
                let count = books.len();
                let store = &self.store;
                match self
                    .generations
                    .apply_if_latest(generation, || store.replace_all(books))
                    .await
                {
                    Ok(()) => ReloadOutcome::Applied { generation, count },
                    Err(latest) => ReloadOutcome::Stale { generation, latest },
                }
            }
            Err(error) => {
                let latest = self.generations.latest();
                if generation == latest {
                    ReloadOutcome::Failed {
                        generation,
                        error: error.into(),
                    }
                } else {
                    ReloadOutcome::Stale { generation, latest }
                }
            }
        };

        match &outcome {
            ReloadOutcome::Applied { generation, count } => {
                info!(generation, count, "Collection reloaded");
                self.emit(CatalogEvent::Reloaded {
                    generation: *generation,
                    count: *count,
                });
            }
            ReloadOutcome::Stale { generation, latest } => {
                debug!(generation, latest, "Discarding stale reload");
                self.emit(CatalogEvent::ReloadDiscarded {
                    generation: *generation,
                    latest: *latest,
                });
            }
            ReloadOutcome::Failed { generation, error } => {
                warn!(generation, error = %error, "Reload failed, keeping previous collection");
                self.emit(CatalogEvent::ReloadFailed {
                    generation: *generation,
                    message: error.to_string(),
                });
            }
        }

        outcome
    }

    fn emit(&self, event: CatalogEvent) {
        self.event_bus.emit(CoreEvent::Catalog(event)).ok();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MockCatalogApi;
    use core_auth::ApiError;
    use core_library::BookStatus;

    fn sync_with(api: MockCatalogApi) -> (CatalogSync, EventBus) {
        let bus = EventBus::new(32);
        (
            CatalogSync::new(Arc::new(api), CollectionStore::new(), bus.clone()),
            bus,
        )
    }

    #[tokio::test]
    async fn test_reload_replaces_collection() {
        let mut api = MockCatalogApi::new();
        api.expect_search_books()
            .withf(|query| query.is_empty())
            .times(1)
            .returning(|_| {
                Ok(vec![
                    Book::new(1, "Zeta", BookStatus::Available),
                    Book::new(2, "Alpha", BookStatus::Issued),
                ])
            });
        let (sync, bus) = sync_with(api);
        let mut events = bus.subscribe();

        let outcome = sync.reload().await;

        assert_eq!(
            outcome,
            ReloadOutcome::Applied {
                generation: 1,
                count: 2
            }
        );
        assert_eq!(sync.store().len().await, 2);
        assert_eq!(
            events.recv().await.unwrap(),
            CoreEvent::Catalog(CatalogEvent::ReloadStarted { generation: 1 })
        );
        assert_eq!(
            events.recv().await.unwrap(),
            CoreEvent::Catalog(CatalogEvent::Reloaded {
                generation: 1,
                count: 2
            })
        );
    }

    #[tokio::test]
    async fn test_stale_response_is_discarded() {
        let (sync, _bus) = sync_with(MockCatalogApi::new());

        let first = sync.begin();
        let second = sync.begin();

        let late = sync
            .complete(first, Ok(vec![Book::new(1, "Old", BookStatus::Available)]))
            .await;
        assert_eq!(
            late,
            ReloadOutcome::Stale {
                generation: first,
                latest: second
            }
        );
        assert!(sync.store().is_empty().await);

        let fresh = sync
            .complete(second, Ok(vec![Book::new(2, "New", BookStatus::Available)]))
            .await;
        assert!(fresh.is_applied());
        assert!(sync.store().contains(core_library::BookId(2)).await);
    }

    #[tokio::test]
    async fn test_older_response_cannot_overwrite_newer() {
        let (sync, _bus) = sync_with(MockCatalogApi::new());

        let first = sync.begin();
        let second = sync.begin();

        // The newer fetch lands first; the older one must not replace it.
        sync.complete(second, Ok(vec![Book::new(2, "New", BookStatus::Available)]))
            .await;
        sync.complete(first, Ok(vec![Book::new(1, "Old", BookStatus::Available)]))
            .await;

        let current = sync.store().current().await;
        assert_eq!(current.len(), 1);
        assert_eq!(current[0].title, "New");
    }

    #[tokio::test]
    async fn test_failed_reload_keeps_previous_collection() {
        let mut api = MockCatalogApi::new();
        api.expect_search_books()
            .returning(|_| Err(ApiError::Transport("connection refused".to_string())));
        let (sync, _bus) = sync_with(api);
        sync.store()
            .replace_all(vec![Book::new(1, "Kept", BookStatus::Available)])
            .await;

        let outcome = sync.reload().await;

        assert!(matches!(
            outcome.error(),
            Some(SyncError::Api(ApiError::Transport(_)))
        ));
        assert_eq!(sync.store().len().await, 1);
    }

    #[tokio::test]
    async fn test_stale_failure_is_not_reported_as_failure() {
        let (sync, _bus) = sync_with(MockCatalogApi::new());
        let first = sync.begin();
        sync.begin();

        let outcome = sync
            .complete(first, Err(ApiError::Transport("timeout".to_string())))
            .await;
        assert!(matches!(outcome, ReloadOutcome::Stale { .. }));
    }
}
