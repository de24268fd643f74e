//! Author list plus create/edit/delete, each mutation followed by a reload.

use crate::api::CatalogApi;
use crate::coordinator::{Generations, ReloadOutcome};
use crate::error::{Result, SyncError};
use crate::mutation::{emit_applied, emit_failed, MutationReport, Operation};
use core_auth::ApiResult;
use core_library::{Author, AuthorDraft, AuthorId};
use core_runtime::events::EventBus;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};

#[derive(Clone)]
pub struct AuthorCoordinator {
    api: Arc<dyn CatalogApi>,
    authors: Arc<RwLock<Arc<[Author]>>>,
    generations: Arc<Generations>,
    event_bus: EventBus,
}

impl AuthorCoordinator {
    pub fn new(api: Arc<dyn CatalogApi>, event_bus: EventBus) -> Self {
        Self {
            api,
            authors: Arc::new(RwLock::new(Vec::<Author>::new().into())),
            generations: Arc::new(Generations::default()),
            event_bus,
        }
    }

    /// Authors from the last applied reload.
    pub async fn list(&self) -> Arc<[Author]> {
        Arc::clone(&*self.authors.read().await)
    }

    pub async fn get(&self, id: AuthorId) -> Option<Author> {
        self.authors
            .read()
            .await
            .iter()
            .find(|author| author.id == id)
            .cloned()
    }

    pub async fn reload(&self) -> ReloadOutcome {
        let generation = self.generations.begin();
        let result = self.api.list_authors().await;
        self.complete(generation, result).await
    }

    /// Apply the response of fetch `generation`. A failure is only reported
    /// while no newer fetch has been issued.
    async fn complete(&self, generation: u64, result: ApiResult<Vec<Author>>) -> ReloadOutcome {
        match result {
            Ok(authors) => {
                let count = authors.len();
                let slot = &self.authors;
                let applied = self
                    .generations
                    .apply_if_latest(generation, || async move {
                        *slot.write().await = authors.into();
                    })
                    .await;
                match applied {
                    Ok(()) => {
                        debug!(generation, count, "Authors reloaded");
                        ReloadOutcome::Applied { generation, count }
                    }
                    Err(latest) => ReloadOutcome::Stale { generation, latest },
                }
            }
            Err(e) => {
                let latest = self.generations.latest();
                if generation != latest {
                    debug!(generation, latest, error = %e, "Discarding stale author failure");
                    return ReloadOutcome::Stale { generation, latest };
                }
                warn!(generation, error = %e, "Author reload failed");
                ReloadOutcome::Failed {
                    generation,
                    error: e.into(),
                }
            }
        }
    }

    #[instrument(skip(self, draft), fields(name = %draft.name))]
    pub async fn create(&self, draft: AuthorDraft) -> Result<MutationReport> {
        draft.validate()?;
        let result = self.api.create_author(&draft).await;
        self.finish(Operation::CreateAuthor, None, result).await
    }

    /// PUT the edited fields. Server errors are returned as sent.
    #[instrument(skip(self, draft), fields(author_id = %id))]
    pub async fn update(&self, id: AuthorId, draft: AuthorDraft) -> Result<Option<MutationReport>> {
        if self.get(id).await.is_none() {
            debug!("Author not loaded, ignoring");
            return Ok(None);
        }
        draft.validate()?;
        let result = self.api.update_author(id, &draft).await;
        self.finish(Operation::UpdateAuthor, Some(id.0), result)
            .await
            .map(Some)
    }

    #[instrument(skip(self), fields(author_id = %id))]
    pub async fn delete(&self, id: AuthorId) -> Result<Option<MutationReport>> {
        if self.get(id).await.is_none() {
            debug!("Author not loaded, ignoring");
            return Ok(None);
        }
        let result = self.api.delete_author(id).await;
        self.finish(Operation::DeleteAuthor, Some(id.0), result)
            .await
            .map(Some)
    }

    async fn finish(
        &self,
        operation: Operation,
        record_id: Option<i64>,
        result: ApiResult<Option<String>>,
    ) -> Result<MutationReport> {
        let message = result.map_err(|e| {
            let error = SyncError::from(e);
            warn!(%operation, error = %error, "Author mutation rejected");
            emit_failed(&self.event_bus, operation, record_id, &error);
            error
        })?;

        info!(%operation, ?record_id, "Author mutation applied");
        emit_applied(&self.event_bus, operation, record_id);

        Ok(MutationReport {
            operation,
            record_id,
            message,
            reload: self.reload().await,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MockCatalogApi;
    use core_auth::ApiError;

    fn le_guin() -> Author {
        Author {
            id: AuthorId(1),
            name: "Ursula K. Le Guin".to_string(),
            bio: None,
        }
    }

    #[tokio::test]
    async fn test_update_puts_and_reloads() {
        let mut api = MockCatalogApi::new();
        api.expect_list_authors().times(2).returning(|| Ok(vec![le_guin()]));
        api.expect_update_author()
            .withf(|id, draft| *id == AuthorId(1) && draft.bio == "Wrote Earthsea")
            .times(1)
            .returning(|_, _| Ok(Some("Author updated successfully".to_string())));

        let authors = AuthorCoordinator::new(Arc::new(api), EventBus::new(16));
        assert!(authors.reload().await.is_applied());

        let report = authors
            .update(
                AuthorId(1),
                AuthorDraft::new("Ursula K. Le Guin", Some("Wrote Earthsea".to_string())),
            )
            .await
            .unwrap()
            .unwrap();

        assert_eq!(report.summary(), "Author updated successfully");
        assert_eq!(report.reload.generation(), 2);
    }

    #[tokio::test]
    async fn test_update_error_is_surfaced_verbatim() {
        let mut api = MockCatalogApi::new();
        api.expect_list_authors().returning(|| Ok(vec![le_guin()]));
        api.expect_update_author().returning(|_, _| {
            Err(ApiError::Application {
                status: 405,
                message: "Method not allowed".to_string(),
            })
        });

        let authors = AuthorCoordinator::new(Arc::new(api), EventBus::new(16));
        authors.reload().await;

        let err = authors
            .update(AuthorId(1), AuthorDraft::new("Le Guin", None))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Method not allowed");
    }

    #[tokio::test]
    async fn test_missing_name_and_unknown_id() {
        let mut api = MockCatalogApi::new();
        api.expect_create_author().times(0);
        api.expect_delete_author().times(0);

        let authors = AuthorCoordinator::new(Arc::new(api), EventBus::new(16));

        let err = authors
            .create(AuthorDraft::new("   ", None))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Author name is required");
        assert_eq!(authors.delete(AuthorId(7)).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_failure_of_superseded_reload_is_stale() {
        let authors = AuthorCoordinator::new(Arc::new(MockCatalogApi::new()), EventBus::new(16));
        let first = authors.generations.begin();
        let second = authors.generations.begin();

        let outcome = authors
            .complete(first, Err(ApiError::Transport("connection reset".to_string())))
            .await;
        assert_eq!(
            outcome,
            ReloadOutcome::Stale {
                generation: first,
                latest: second
            }
        );

        let outcome = authors
            .complete(second, Err(ApiError::Transport("connection reset".to_string())))
            .await;
        assert!(matches!(outcome, ReloadOutcome::Failed { generation, .. } if generation == second));
        assert!(authors.list().await.is_empty());
    }

    #[tokio::test]
    async fn test_empty_author_list() {
        let mut api = MockCatalogApi::new();
        api.expect_list_authors().returning(|| Ok(Vec::new()));

        let authors = AuthorCoordinator::new(Arc::new(api), EventBus::new(16));
        assert_eq!(
            authors.reload().await,
            ReloadOutcome::Applied {
                generation: 1,
                count: 0
            }
        );
        assert!(authors.list().await.is_empty());
    }
}
