//! Collection store: the authoritative in-memory copy of the catalog.
//!
//! The contents are replaced wholesale on every successful fetch. Readers get
//! an `Arc<[Book]>` snapshot, so filtering and sorting never touch the store.

use crate::models::{Book, BookId};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

#[derive(Clone)]
pub struct CollectionStore {
    records: Arc<RwLock<Arc<[Book]>>>,
}

impl CollectionStore {
    pub fn new() -> Self {
        Self::with_records(Vec::new())
    }

    /// Store seeded with `records`.
    pub fn with_records(records: Vec<Book>) -> Self {
        Self {
            records: Arc::new(RwLock::new(records.into())),
        }
    }

    /// Replace the whole collection.
    pub async fn replace_all(&self, records: Vec<Book>) {
        let count = records.len();
        *self.records.write().await = records.into();
        debug!(count, "Collection replaced");
    }

    /// Current snapshot, in server order.
    pub async fn current(&self) -> Arc<[Book]> {
        Arc::clone(&*self.records.read().await)
    }

    pub async fn get(&self, id: BookId) -> Option<Book> {
        self.records
            .read()
            .await
            .iter()
            .find(|book| book.id == id)
            .cloned()
    }

    pub async fn contains(&self, id: BookId) -> bool {
        self.records.read().await.iter().any(|book| book.id == id)
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

impl Default for CollectionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CollectionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let len = self.records.try_read().map(|r| r.len()).ok();
        f.debug_struct("CollectionStore").field("len", &len).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BookStatus;

    #[tokio::test]
    async fn test_replace_all_swaps_contents() {
        let store = CollectionStore::new();
        assert!(store.is_empty().await);

        store
            .replace_all(vec![
                Book::new(1, "Zeta", BookStatus::Available),
                Book::new(2, "Alpha", BookStatus::Issued),
            ])
            .await;
        assert_eq!(store.len().await, 2);
        assert!(store.contains(BookId(2)).await);

        store
            .replace_all(vec![Book::new(3, "Gamma", BookStatus::Available)])
            .await;
        assert_eq!(store.len().await, 1);
        assert!(!store.contains(BookId(1)).await);
        assert_eq!(store.get(BookId(3)).await.unwrap().title, "Gamma");
    }

    #[tokio::test]
    async fn test_snapshot_survives_replacement() {
        let store = CollectionStore::with_records(vec![Book::new(1, "Zeta", BookStatus::Available)]);
        let before = store.current().await;

        store.replace_all(Vec::new()).await;

        assert_eq!(before.len(), 1);
        assert!(store.current().await.is_empty());
    }
}
