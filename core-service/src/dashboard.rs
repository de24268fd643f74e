//! # Dashboard
//!
//! The façade host applications talk to. It wires configuration, session
//! handling, the catalog coordinators and the [`AppState`] together:
//!
//! - loads and mutations feed their results back as [`Message`]s
//! - [`Dashboard::presentation`] projects the current state
//! - [`Dashboard::dispatch`] runs a rendered row's action through the
//!   [`ActionRegistry`]
//!
//! ```no_run
//! use core_service::{Dashboard, Section};
//!
//! # async fn example() -> core_service::Result<()> {
//! let dashboard = Dashboard::builder()
//!     .api_base_url("http://127.0.0.1:5000")
//!     .build()?;
//!
//! dashboard.login("admin@example.com", "secret1").await?;
//! let view = dashboard.open(Section::Books).await?;
//! println!("{}", view);
//! # Ok(())
//! # }
//! ```

use crate::actions::{ActionRegistry, Intent};
use crate::error::{CoreError, Result};
use crate::state::{project, update, AppState, Message, Section};
use bridge_traits::{HttpClient, SecureStore};
use core_auth::{ApiClient, ApiError, AuthManager, Credentials, SignupRequest, UserProfile};
use core_library::render::{render_user_issues, ActionKind, Presentation};
use core_library::{
    AuthorDraft, AuthorId, Book, BookDraft, BookId, BookPatch, CollectionStore, User, UserId,
};
use core_runtime::config::{CoreConfig, CoreConfigBuilder};
use core_runtime::events::{EventBus, EventStream};
use core_sync::{
    AuthorCoordinator, CatalogApi, CatalogSync, MutationCoordinator, MutationReport,
    ReloadOutcome, RestCatalogApi, SearchQuery, SyncError,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Result of a dispatched row action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    Details(Book),
    Mutated(MutationReport),
}

#[derive(Clone)]
pub struct Dashboard {
    config: Arc<CoreConfig>,
    event_bus: EventBus,
    auth: AuthManager,
    catalog: Arc<dyn CatalogApi>,
    sync: CatalogSync,
    mutations: MutationCoordinator,
    authors: AuthorCoordinator,
    state: Arc<RwLock<AppState>>,
}

impl Dashboard {
    pub fn builder() -> DashboardBuilder {
        DashboardBuilder::new()
    }

    pub fn new(config: CoreConfig) -> Self {
        let event_bus = EventBus::new(config.event_buffer_size);
        let client = ApiClient::from_config(&config, event_bus.clone());
        let catalog: Arc<dyn CatalogApi> = Arc::new(RestCatalogApi::new(client.clone()));
        let sync = CatalogSync::new(
            Arc::clone(&catalog),
            CollectionStore::new(),
            event_bus.clone(),
        );

        info!(api = %config.api_base_url, "Dashboard initialized");

        Self {
            mutations: MutationCoordinator::new(sync.clone(), event_bus.clone()),
            authors: AuthorCoordinator::new(Arc::clone(&catalog), event_bus.clone()),
            auth: AuthManager::new(client),
            config: Arc::new(config),
            event_bus,
            catalog,
            sync,
            state: Arc::new(RwLock::new(AppState::default())),
        }
    }

    pub fn api_base_url(&self) -> &str {
        &self.config.api_base_url
    }

    pub fn subscribe(&self) -> EventStream {
        EventStream::new(self.event_bus.subscribe())
    }

    // ------------------------------------------------------------------
    // State
    // ------------------------------------------------------------------

    pub async fn state(&self) -> AppState {
        self.state.read().await.clone()
    }

    /// Apply `message` and return the new state.
    pub async fn send(&self, message: Message) -> AppState {
        let mut state = self.state.write().await;
        *state = update(&state, message);
        state.clone()
    }

    pub async fn presentation(&self) -> Presentation {
        project(&*self.state.read().await)
    }

    /// Actions offered by the current presentation.
    pub async fn actions(&self) -> ActionRegistry {
        ActionRegistry::from_presentation(&self.presentation().await)
    }

    // ------------------------------------------------------------------
    // Session
    // ------------------------------------------------------------------

    pub async fn login(&self, email: &str, password: &str) -> Result<UserProfile> {
        let user = self.auth.login(Credentials::new(email, password)).await?;
        *self.state.write().await = AppState::default();
        Ok(user)
    }

    pub async fn signup(&self, request: SignupRequest) -> Result<String> {
        Ok(self.auth.signup(request).await?)
    }

    pub async fn logout(&self) -> Result<()> {
        self.auth.logout().await?;
        *self.state.write().await = AppState::default();
        Ok(())
    }

    pub async fn current_user(&self) -> Result<Option<UserProfile>> {
        Ok(self.auth.current_user().await?)
    }

    // ------------------------------------------------------------------
    // Loading
    // ------------------------------------------------------------------

    /// Switch to `section`, load it, and return what it shows.
    pub async fn open(&self, section: Section) -> Result<Presentation> {
        self.send(Message::Navigate(section)).await;
        self.refresh(section).await?;
        Ok(self.presentation().await)
    }

    pub async fn refresh(&self, section: Section) -> Result<()> {
        match section {
            Section::Books => self.refresh_books().await,
            Section::Authors => self.refresh_authors().await,
            Section::Users => self.refresh_users().await,
            Section::Issued => self.refresh_issued().await,
        }
    }

    pub async fn refresh_books(&self) -> Result<()> {
        self.send(Message::LoadStarted(Section::Books)).await;
        let outcome = self.sync.reload().await;
        match self.absorb_books(&outcome).await {
            Some(error) => Err(error.into()),
            None => Ok(()),
        }
    }

    /// Switch to books and reload them narrowed on the server by the current
    /// title, category and status filters.
    ///
    /// The result replaces the collection, so a later [`refresh_books`]
    /// brings the rest back.
    ///
    /// [`refresh_books`]: Dashboard::refresh_books
    pub async fn search_books(&self) -> Result<Presentation> {
        let state = self.send(Message::Navigate(Section::Books)).await;
        let query = SearchQuery::from_view(&state.view);
        self.send(Message::LoadStarted(Section::Books)).await;
        let outcome = self.sync.reload_matching(&query).await;
        match self.absorb_books(&outcome).await {
            Some(error) => Err(error.into()),
            None => Ok(self.presentation().await),
        }
    }

    pub async fn refresh_authors(&self) -> Result<()> {
        self.send(Message::LoadStarted(Section::Authors)).await;
        let outcome = self.authors.reload().await;
        match self.absorb_authors(&outcome).await {
            Some(error) => Err(error.into()),
            None => Ok(()),
        }
    }

    pub async fn refresh_users(&self) -> Result<()> {
        self.send(Message::LoadStarted(Section::Users)).await;
        match self.catalog.list_users().await {
            Ok(users) => {
                self.send(Message::UsersLoaded(users.into())).await;
                Ok(())
            }
            Err(e) => Err(self.load_failed(Section::Users, e.into()).await),
        }
    }

    pub async fn refresh_issued(&self) -> Result<()> {
        self.send(Message::LoadStarted(Section::Issued)).await;
        match self.catalog.list_issued(None).await {
            Ok(records) => {
                self.send(Message::IssuedLoaded(records.into())).await;
                Ok(())
            }
            Err(e) => Err(self.load_failed(Section::Issued, e.into()).await),
        }
    }

    /// One user's loans, with the user record when it can be found.
    ///
    /// Not part of [`AppState`]: it is a detail view, not a section.
    pub async fn user_issues(&self, user: UserId) -> Result<(Option<User>, Presentation)> {
        let (users, records) = futures::try_join!(
            self.catalog.list_users(),
            self.catalog.list_issued(Some(user)),
        )
        .map_err(SyncError::from)?;

        let owner = users.into_iter().find(|u| u.id == user);
        Ok((owner, render_user_issues(&records)))
    }

    /// A book from the loaded collection.
    pub async fn book(&self, id: BookId) -> Option<Book> {
        self.sync.store().get(id).await
    }

    // ------------------------------------------------------------------
    // Mutations
    // ------------------------------------------------------------------

    pub async fn add_book(&self, draft: BookDraft) -> Result<MutationReport> {
        let result = self.mutations.create(draft).await;
        self.after_book_mutation(result).await
    }

    pub async fn edit_book(&self, id: BookId, patch: BookPatch) -> Result<Option<MutationReport>> {
        let result = self.mutations.update(id, patch).await;
        self.after_book_mutation(result).await
    }

    pub async fn issue_book(&self, id: BookId) -> Result<Option<MutationReport>> {
        let result = self.mutations.issue(id).await;
        self.after_book_mutation(result).await
    }

    pub async fn return_book(&self, id: BookId) -> Result<Option<MutationReport>> {
        let result = self.mutations.return_book(id).await;
        self.after_book_mutation(result).await
    }

    pub async fn delete_book(&self, id: BookId) -> Result<Option<MutationReport>> {
        let result = self.mutations.delete(id).await;
        self.after_book_mutation(result).await
    }

    pub async fn add_author(&self, draft: AuthorDraft) -> Result<MutationReport> {
        let result = self.authors.create(draft).await;
        self.after_author_mutation(result).await
    }

    pub async fn edit_author(
        &self,
        id: AuthorId,
        draft: AuthorDraft,
    ) -> Result<Option<MutationReport>> {
        let result = self.authors.update(id, draft).await;
        self.after_author_mutation(result).await
    }

    pub async fn delete_author(&self, id: AuthorId) -> Result<Option<MutationReport>> {
        let result = self.authors.delete(id).await;
        self.after_author_mutation(result).await
    }

    /// Run the action a rendered row offers.
    ///
    /// Returns `Ok(None)` when `(kind, id)` is not offered by the current
    /// presentation.
    pub async fn dispatch(&self, kind: ActionKind, id: BookId) -> Result<Option<DispatchOutcome>> {
        let Some(intent) = self.actions().await.dispatch(kind, id) else {
            return Ok(None);
        };

        let report = match intent {
            Intent::ShowDetails(id) => return Ok(self.book(id).await.map(DispatchOutcome::Details)),
            Intent::Issue(id) => self.issue_book(id).await?,
            Intent::Return(id) => self.return_book(id).await?,
            Intent::Delete(id) => self.delete_book(id).await?,
        };
        Ok(report.map(DispatchOutcome::Mutated))
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    async fn after_book_mutation<T>(&self, result: core_sync::Result<T>) -> Result<T>
    where
        T: AsReport,
    {
        match result {
            Ok(value) => {
                // A failed reload reports into the error region, so clear first.
                self.send(Message::ClearError).await;
                if let Some(report) = value.report() {
                    if let Some(error) = self.absorb_books(&report.reload).await {
                        warn!(error = %error, "Reload after mutation failed");
                    }
                }
                Ok(value)
            }
            Err(error) => Err(self.mutation_failed(error).await),
        }
    }

    async fn after_author_mutation<T>(&self, result: core_sync::Result<T>) -> Result<T>
    where
        T: AsReport,
    {
        match result {
            Ok(value) => {
                if let Some(report) = value.report() {
                    if let Some(error) = self.absorb_authors(&report.reload).await {
                        warn!(error = %error, "Author reload after mutation failed");
                    }
                }
                Ok(value)
            }
            Err(error) => Err(self.mutation_failed(error).await),
        }
    }

    /// Feed a book reload into the state. Returns the error of a failed one.
    async fn absorb_books(&self, outcome: &ReloadOutcome) -> Option<SyncError> {
        match outcome {
            ReloadOutcome::Applied { .. } => {
                let records = self.sync.store().current().await;
                self.send(Message::BooksLoaded(records)).await;
                None
            }
            ReloadOutcome::Stale { generation, .. } => {
                debug!(generation, "Newer reload in flight");
                None
            }
            ReloadOutcome::Failed { error, .. } => {
                self.load_failed(Section::Books, error.clone()).await;
                Some(error.clone())
            }
        }
    }

    async fn absorb_authors(&self, outcome: &ReloadOutcome) -> Option<SyncError> {
        match outcome {
            ReloadOutcome::Applied { .. } => {
                let records = self.authors.list().await;
                self.send(Message::AuthorsLoaded(records)).await;
                None
            }
            ReloadOutcome::Stale { .. } => None,
            ReloadOutcome::Failed { error, .. } => {
                self.load_failed(Section::Authors, error.clone()).await;
                Some(error.clone())
            }
        }
    }

    async fn load_failed(&self, section: Section, error: SyncError) -> CoreError {
        self.send(Message::LoadFailed {
            section,
            message: load_failure_message(section, &error),
        })
        .await;
        // Last, so the sign-in prompt owns the error region.
        if error.is_unauthenticated() {
            self.send(Message::SessionExpired).await;
        }
        error.into()
    }

    async fn mutation_failed(&self, error: SyncError) -> CoreError {
        if error.is_unauthenticated() {
            self.send(Message::SessionExpired).await;
        } else {
            self.send(Message::MutationFailed(error.to_string())).await;
        }
        error.into()
    }
}

/// Text for a failed load. Network failures get a retry prompt, anything
/// the server said is shown as sent.
pub fn load_failure_message(section: Section, error: &SyncError) -> String {
    match error {
        SyncError::Api(ApiError::Transport(_)) => {
            format!("Failed to load {}. Please try again.", section.noun())
        }
        other => other.to_string(),
    }
}

/// Mutation results that may carry a report.
trait AsReport {
    fn report(&self) -> Option<&MutationReport>;
}

impl AsReport for MutationReport {
    fn report(&self) -> Option<&MutationReport> {
        Some(self)
    }
}

impl AsReport for Option<MutationReport> {
    fn report(&self) -> Option<&MutationReport> {
        self.as_ref()
    }
}

/// Builder for [`Dashboard`] over a [`CoreConfigBuilder`].
#[derive(Default)]
pub struct DashboardBuilder {
    config: CoreConfigBuilder,
}

impl DashboardBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed from `LIBDASH_API_URL` and `LIBDASH_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            config: CoreConfigBuilder::from_env()?,
        })
    }

    pub fn api_base_url(mut self, url: impl Into<String>) -> Self {
        self.config = self.config.api_base_url(url);
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config = self.config.request_timeout(timeout);
        self
    }

    pub fn event_buffer_size(mut self, size: usize) -> Self {
        self.config = self.config.event_buffer_size(size);
        self
    }

    pub fn http_client(mut self, client: Arc<dyn HttpClient>) -> Self {
        self.config = self.config.http_client(client);
        self
    }

    pub fn secure_store(mut self, store: Arc<dyn SecureStore>) -> Self {
        self.config = self.config.secure_store(store);
        self
    }

    pub fn build(self) -> Result<Dashboard> {
        Ok(Dashboard::new(self.config.build()?))
    }
}
