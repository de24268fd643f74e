//! # Mutation Coordinator
//!
//! Create, update, delete and status changes for books.
//!
//! Every successful mutation is followed by exactly one full reload through
//! [`CatalogSync`]; nothing is applied optimistically. A reload that fails
//! after a successful mutation is reported in the [`MutationReport`] and not
//! retried.
//!
//! Mutations addressed at a book the local store does not hold are silent
//! no-ops: no request is sent and `Ok(None)` is returned.

use crate::api::CatalogApi;
use crate::coordinator::{CatalogSync, ReloadOutcome};
use crate::error::{Result, SyncError};
use core_auth::ApiResult;
use core_library::{BookDraft, BookId, BookPatch, BookStatus};
use core_runtime::events::{CatalogEvent, CoreEvent, EventBus};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Mutation kinds, as reported in events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    CreateBook,
    UpdateBook,
    DeleteBook,
    IssueBook,
    ReturnBook,
    CreateAuthor,
    UpdateAuthor,
    DeleteAuthor,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::CreateBook => "create_book",
            Operation::UpdateBook => "update_book",
            Operation::DeleteBook => "delete_book",
            Operation::IssueBook => "issue_book",
            Operation::ReturnBook => "return_book",
            Operation::CreateAuthor => "create_author",
            Operation::UpdateAuthor => "update_author",
            Operation::DeleteAuthor => "delete_author",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a mutation the server accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationReport {
    pub operation: Operation,
    pub record_id: Option<i64>,
    /// The server's acknowledgement, e.g. "Book updated successfully".
    pub message: Option<String>,
    pub reload: ReloadOutcome,
}

impl MutationReport {
    /// Message to show the user: the server's, or a generic one.
    pub fn summary(&self) -> String {
        self.message
            .clone()
            .unwrap_or_else(|| format!("{} succeeded", self.operation))
    }
}

pub(crate) fn emit_applied(bus: &EventBus, operation: Operation, record_id: Option<i64>) {
    bus.emit(CoreEvent::Catalog(CatalogEvent::MutationApplied {
        operation: operation.to_string(),
        record_id,
    }))
    .ok();
}

pub(crate) fn emit_failed(
    bus: &EventBus,
    operation: Operation,
    record_id: Option<i64>,
    error: &SyncError,
) {
    bus.emit(CoreEvent::Catalog(CatalogEvent::MutationFailed {
        operation: operation.to_string(),
        record_id,
        message: error.to_string(),
    }))
    .ok();
}

#[derive(Clone)]
pub struct MutationCoordinator {
    api: Arc<dyn CatalogApi>,
    sync: CatalogSync,
    event_bus: EventBus,
}

impl MutationCoordinator {
    pub fn new(sync: CatalogSync, event_bus: EventBus) -> Self {
        Self {
            api: Arc::clone(sync.api()),
            sync,
            event_bus,
        }
    }

    pub fn sync(&self) -> &CatalogSync {
        &self.sync
    }

    /// Validate and post a new book, then reload.
    #[instrument(skip(self, draft), fields(title = %draft.title))]
    pub async fn create(&self, draft: BookDraft) -> Result<MutationReport> {
        draft.validate()?;
        let result = self.api.create_book(&draft).await;
        self.finish(Operation::CreateBook, None, result).await
    }

    /// Apply `patch` to book `id`. `Ok(None)` when the book is not loaded.
    #[instrument(skip(self, patch), fields(book_id = %id))]
    pub async fn update(&self, id: BookId, patch: BookPatch) -> Result<Option<MutationReport>> {
        self.update_as(Operation::UpdateBook, id, patch).await
    }

    #[instrument(skip(self), fields(book_id = %id))]
    pub async fn delete(&self, id: BookId) -> Result<Option<MutationReport>> {
        if !self.is_loaded(id).await {
            return Ok(None);
        }
        let result = self.api.delete_book(id).await;
        self.finish(Operation::DeleteBook, Some(id.0), result)
            .await
            .map(Some)
    }

    /// `update(id, {status})`.
    #[instrument(skip(self), fields(book_id = %id, status = %status))]
    pub async fn set_status(
        &self,
        id: BookId,
        status: BookStatus,
    ) -> Result<Option<MutationReport>> {
        let operation = match status {
            BookStatus::Available => Operation::ReturnBook,
            BookStatus::Issued => Operation::IssueBook,
        };
        self.update_as(operation, id, BookPatch::status(status))
            .await
    }

    pub async fn issue(&self, id: BookId) -> Result<Option<MutationReport>> {
        self.set_status(id, BookStatus::Issued).await
    }

    pub async fn return_book(&self, id: BookId) -> Result<Option<MutationReport>> {
        self.set_status(id, BookStatus::Available).await
    }

    async fn update_as(
        &self,
        operation: Operation,
        id: BookId,
        patch: BookPatch,
    ) -> Result<Option<MutationReport>> {
        if !self.is_loaded(id).await {
            return Ok(None);
        }
        patch.validate()?;
        let result = self.api.update_book(id, &patch).await;
        self.finish(operation, Some(id.0), result).await.map(Some)
    }

    async fn is_loaded(&self, id: BookId) -> bool {
        let loaded = self.sync.store().contains(id).await;
        if !loaded {
            debug!(book_id = %id, "Book not in the collection, ignoring");
        }
        loaded
    }

    async fn finish(
        &self,
        operation: Operation,
        record_id: Option<i64>,
        result: ApiResult<Option<String>>,
    ) -> Result<MutationReport> {
        let message = match result {
            Ok(message) => message,
            Err(e) => {
                let error = SyncError::from(e);
                warn!(%operation, error = %error, "Mutation rejected");
                emit_failed(&self.event_bus, operation, record_id, &error);
                return Err(error);
            }
        };

        info!(%operation, ?record_id, "Mutation applied");
        emit_applied(&self.event_bus, operation, record_id);

        let reload = self.sync.reload().await;
        Ok(MutationReport {
            operation,
            record_id,
            message,
            reload,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MockCatalogApi;
    use core_auth::ApiError;
    use core_library::{AuthorId, Book, CollectionStore};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn loaded_books() -> Vec<Book> {
        vec![
            Book::new(1, "Zeta", BookStatus::Available),
            Book::new(2, "Alpha", BookStatus::Issued),
        ]
    }

    async fn coordinator(api: MockCatalogApi) -> (MutationCoordinator, EventBus) {
        let bus = EventBus::new(32);
        let store = CollectionStore::with_records(loaded_books());
        let sync = CatalogSync::new(Arc::new(api), store, bus.clone());
        (MutationCoordinator::new(sync, bus.clone()), bus)
    }

    #[tokio::test]
    async fn test_set_status_patches_then_reloads_once() {
        let mut api = MockCatalogApi::new();
        api.expect_update_book()
            .withf(|id, patch| *id == BookId(1) && *patch == BookPatch::status(BookStatus::Issued))
            .times(1)
            .returning(|_, _| Ok(Some("Book updated successfully".to_string())));

        let reloads = Arc::new(AtomicUsize::new(0));
        let counter = reloads.clone();
        api.expect_search_books().returning(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(vec![
                Book::new(1, "Zeta", BookStatus::Issued),
                Book::new(2, "Alpha", BookStatus::Issued),
            ])
        });

        let (mutations, _bus) = coordinator(api).await;
        let report = mutations.issue(BookId(1)).await.unwrap().unwrap();

        assert_eq!(report.operation, Operation::IssueBook);
        assert_eq!(report.summary(), "Book updated successfully");
        assert!(report.reload.is_applied());
        assert_eq!(reloads.load(Ordering::SeqCst), 1);

        let book = mutations.sync().store().get(BookId(1)).await.unwrap();
        assert_eq!(book.status, BookStatus::Issued);
    }

    #[tokio::test]
    async fn test_unknown_id_sends_nothing() {
        let mut api = MockCatalogApi::new();
        api.expect_update_book().times(0);
        api.expect_delete_book().times(0);
        api.expect_search_books().times(0);

        let (mutations, bus) = coordinator(api).await;
        let mut events = bus.subscribe();

        assert_eq!(mutations.delete(BookId(99)).await.unwrap(), None);
        assert_eq!(mutations.return_book(BookId(99)).await.unwrap(), None);
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_rejected_mutation_skips_reload_and_reports() {
        let mut api = MockCatalogApi::new();
        api.expect_delete_book().returning(|_| {
            Err(ApiError::Application {
                status: 400,
                message: "Cannot delete an issued book".to_string(),
            })
        });
        api.expect_search_books().times(0);

        let (mutations, bus) = coordinator(api).await;
        let mut events = bus.subscribe();

        let err = mutations.delete(BookId(2)).await.unwrap_err();
        assert_eq!(err.to_string(), "Cannot delete an issued book");

        match events.recv().await.unwrap() {
            CoreEvent::Catalog(CatalogEvent::MutationFailed {
                operation,
                record_id,
                message,
            }) => {
                assert_eq!(operation, "delete_book");
                assert_eq!(record_id, Some(2));
                assert_eq!(message, "Cannot delete an issued book");
            }
            other => panic!("unexpected event {:?}", other),
        }
        assert_eq!(mutations.sync().store().len().await, 2);
    }

    #[tokio::test]
    async fn test_invalid_draft_is_rejected_locally() {
        let mut api = MockCatalogApi::new();
        api.expect_create_book().times(0);

        let (mutations, _bus) = coordinator(api).await;
        let err = mutations
            .create(BookDraft::new("", "Sci-Fi", AuthorId(1), "123"))
            .await
            .unwrap_err();

        assert!(matches!(err, SyncError::InvalidInput(_)));
        assert_eq!(err.to_string(), "Title is required");
    }

    #[tokio::test]
    async fn test_failed_reload_after_success_is_reported() {
        let mut api = MockCatalogApi::new();
        api.expect_create_book().returning(|_| Ok(None));
        api.expect_search_books()
            .times(1)
            .returning(|_| Err(ApiError::Transport("connection reset".to_string())));

        let (mutations, _bus) = coordinator(api).await;
        let report = mutations
            .create(BookDraft::new("Dune", "Sci-Fi", AuthorId(1), "123"))
            .await
            .unwrap();

        assert_eq!(report.summary(), "create_book succeeded");
        assert!(report.reload.error().is_some());
        // The stale collection stays in place.
        assert_eq!(mutations.sync().store().len().await, 2);
    }
}
