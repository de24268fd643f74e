//! # Application State
//!
//! All UI-facing state lives in one [`AppState`] value. User input and load
//! results arrive as [`Message`]s and [`update`] returns the next state
//! without touching the previous one. [`project`] turns a state into the
//! [`Presentation`] of the active section.

use core_library::render::{
    render_authors, render_books, render_issued, render_users, Presentation,
};
use core_library::{
    visible, Author, Book, IssueRecord, SortKey, StatusFilter, TextFilters, User, ViewMode,
    ViewState,
};
use std::fmt;
use std::sync::Arc;

pub const SESSION_EXPIRED: &str = "Your session has expired. Please log in again.";

/// Dashboard sections.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Section {
    #[default]
    Books,
    Issued,
    Users,
    Authors,
}

impl Section {
    /// Used in "Failed to load ..." messages.
    pub fn noun(&self) -> &'static str {
        match self {
            Section::Books => "books",
            Section::Issued => "issued books",
            Section::Users => "users",
            Section::Authors => "authors",
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let title = match self {
            Section::Books => "Books",
            Section::Issued => "Issued Books",
            Section::Users => "Users",
            Section::Authors => "Authors",
        };
        f.write_str(title)
    }
}

/// Records of one section and where their loading stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slot<T> {
    pub records: Arc<[T]>,
    pub loaded: bool,
    pub loading: bool,
    /// Set when a load failed before anything was loaded.
    pub failure: Option<String>,
}

impl<T> Default for Slot<T> {
    fn default() -> Self {
        Self {
            records: Arc::from(Vec::<T>::new()),
            loaded: false,
            loading: false,
            failure: None,
        }
    }
}

impl<T> Slot<T> {
    fn started(&self) -> Self {
        Self {
            records: Arc::clone(&self.records),
            loaded: self.loaded,
            loading: true,
            failure: None,
        }
    }

    fn filled(records: Arc<[T]>) -> Self {
        Self {
            records,
            loaded: true,
            loading: false,
            failure: None,
        }
    }

    fn failed(&self, message: &str) -> Self {
        Self {
            records: Arc::clone(&self.records),
            loaded: self.loaded,
            loading: false,
            failure: (!self.loaded).then(|| message.to_string()),
        }
    }

    fn placeholder(&self) -> Option<Presentation> {
        if self.loaded {
            return None;
        }
        Some(match &self.failure {
            Some(message) => Presentation::error(message.clone()),
            None => Presentation::Loading,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppState {
    pub section: Section,
    pub view: ViewState,
    pub books: Slot<Book>,
    pub authors: Slot<Author>,
    pub users: Slot<User>,
    pub issued: Slot<IssueRecord>,
    /// Error region of the active section.
    pub error: Option<String>,
    pub session_expired: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    SetTitleFilter(String),
    SetAuthorFilter(String),
    SetCategoryFilter(String),
    SetStatusFilter(StatusFilter),
    SetSort(Option<SortKey>),
    SetViewMode(ViewMode),
    ResetFilters,
    Navigate(Section),
    LoadStarted(Section),
    BooksLoaded(Arc<[Book]>),
    AuthorsLoaded(Arc<[Author]>),
    UsersLoaded(Arc<[User]>),
    IssuedLoaded(Arc<[IssueRecord]>),
    LoadFailed { section: Section, message: String },
    MutationFailed(String),
    ClearError,
    SessionExpired,
}

/// The state after `message`. `state` itself is left as it was.
pub fn update(state: &AppState, message: Message) -> AppState {
    let mut next = state.clone();

    match message {
        Message::SetTitleFilter(title) => next.view.text.title = title,
        Message::SetAuthorFilter(author) => next.view.text.author = author,
        Message::SetCategoryFilter(category) => next.view.text.category = category,
        Message::SetStatusFilter(status) => next.view.status = status,
        Message::SetSort(sort) => next.view.sort = sort,
        Message::SetViewMode(mode) => next.view.view_mode = mode,
        Message::ResetFilters => {
            next.view.status = StatusFilter::All;
            next.view.text = TextFilters::default();
        }
        Message::Navigate(section) => {
            next.section = section;
            next.error = None;
        }
        Message::LoadStarted(section) => match section {
            Section::Books => next.books = state.books.started(),
            Section::Authors => next.authors = state.authors.started(),
            Section::Users => next.users = state.users.started(),
            Section::Issued => next.issued = state.issued.started(),
        },
        Message::BooksLoaded(records) => {
            next.books = Slot::filled(records);
            next.session_expired = false;
        }
        Message::AuthorsLoaded(records) => {
            next.authors = Slot::filled(records);
            next.session_expired = false;
        }
        Message::UsersLoaded(records) => {
            next.users = Slot::filled(records);
            next.session_expired = false;
        }
        Message::IssuedLoaded(records) => {
            next.issued = Slot::filled(records);
            next.session_expired = false;
        }
        Message::LoadFailed { section, message } => {
            let loaded = match section {
                Section::Books => {
                    next.books = state.books.failed(&message);
                    next.books.loaded
                }
                Section::Authors => {
                    next.authors = state.authors.failed(&message);
                    next.authors.loaded
                }
                Section::Users => {
                    next.users = state.users.failed(&message);
                    next.users.loaded
                }
                Section::Issued => {
                    next.issued = state.issued.failed(&message);
                    next.issued.loaded
                }
            };
            // With data already on screen the old records stay and the
            // failure goes to the error region instead.
            if loaded && section == state.section {
                next.error = Some(message);
            }
        }
        Message::MutationFailed(message) => next.error = Some(message),
        Message::ClearError => next.error = None,
        Message::SessionExpired => {
            next.session_expired = true;
            next.error = Some(SESSION_EXPIRED.to_string());
        }
    }

    next
}

/// What the active section shows.
pub fn project(state: &AppState) -> Presentation {
    match state.section {
        Section::Books => state.books.placeholder().unwrap_or_else(|| {
            render_books(
                state.view.view_mode,
                &visible(&state.books.records, &state.view),
            )
        }),
        Section::Authors => state
            .authors
            .placeholder()
            .unwrap_or_else(|| render_authors(&state.authors.records)),
        Section::Users => state
            .users
            .placeholder()
            .unwrap_or_else(|| render_users(&state.users.records)),
        Section::Issued => state
            .issued
            .placeholder()
            .unwrap_or_else(|| render_issued(&state.issued.records)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_library::render::NO_BOOKS;
    use core_library::{BookId, BookStatus};

    fn zeta_alpha() -> Arc<[Book]> {
        vec![
            Book::new(1, "Zeta", BookStatus::Available),
            Book::new(2, "Alpha", BookStatus::Issued),
        ]
        .into()
    }

    fn loaded() -> AppState {
        update(&AppState::default(), Message::BooksLoaded(zeta_alpha()))
    }

    fn book_ids(presentation: &Presentation) -> Vec<BookId> {
        match presentation {
            Presentation::BookList(cards) => cards.iter().map(|c| c.id).collect(),
            Presentation::BookTable(rows) => rows.iter().map(|r| r.id).collect(),
            other => panic!("expected books, got {:?}", other),
        }
    }

    #[test]
    fn test_update_leaves_previous_state_untouched() {
        let before = loaded();
        let snapshot = before.clone();

        let after = update(&before, Message::SetSort(Some(SortKey::Title)));

        assert_eq!(before, snapshot);
        assert_eq!(after.view.sort, Some(SortKey::Title));
    }

    #[test]
    fn test_loading_then_loaded() {
        let state = update(&AppState::default(), Message::LoadStarted(Section::Books));
        assert_eq!(project(&state), Presentation::Loading);

        let state = update(&state, Message::BooksLoaded(Vec::<Book>::new().into()));
        assert_eq!(project(&state), Presentation::empty(NO_BOOKS));
    }

    #[test]
    fn test_projection_follows_view_state() {
        let state = update(&loaded(), Message::SetSort(Some(SortKey::Title)));
        assert_eq!(book_ids(&project(&state)), vec![BookId(2), BookId(1)]);

        let state = update(&state, Message::SetViewMode(ViewMode::Table));
        assert_eq!(book_ids(&project(&state)), vec![BookId(1)]);

        let state = update(&state, Message::SetViewMode(ViewMode::List));
        let state = update(&state, Message::SetStatusFilter(StatusFilter::Issued));
        assert_eq!(book_ids(&project(&state)), vec![BookId(2)]);

        let state = update(&state, Message::SetTitleFilter("zz".to_string()));
        assert_eq!(project(&state), Presentation::empty(NO_BOOKS));

        let state = update(&state, Message::ResetFilters);
        assert_eq!(book_ids(&project(&state)).len(), 2);
        assert_eq!(state.view.sort, Some(SortKey::Title));
    }

    #[test]
    fn test_first_load_failure_shows_error_placeholder() {
        let state = update(&AppState::default(), Message::LoadStarted(Section::Books));
        let state = update(
            &state,
            Message::LoadFailed {
                section: Section::Books,
                message: "Failed to load books. Please try again.".to_string(),
            },
        );

        assert_eq!(
            project(&state),
            Presentation::error("Failed to load books. Please try again.")
        );
        assert!(state.error.is_none());
    }

    #[test]
    fn test_later_failure_keeps_records_and_reports() {
        let state = update(&loaded(), Message::LoadStarted(Section::Books));
        let state = update(
            &state,
            Message::LoadFailed {
                section: Section::Books,
                message: "Internal server error".to_string(),
            },
        );

        assert_eq!(book_ids(&project(&state)).len(), 2);
        assert_eq!(state.error.as_deref(), Some("Internal server error"));
    }

    #[test]
    fn test_errors_and_navigation() {
        let state = update(&loaded(), Message::MutationFailed("Book not found".to_string()));
        assert_eq!(state.error.as_deref(), Some("Book not found"));

        let state = update(&state, Message::Navigate(Section::Authors));
        assert!(state.error.is_none());
        assert_eq!(project(&state), Presentation::Loading);

        let state = update(&state, Message::AuthorsLoaded(Vec::<Author>::new().into()));
        assert_eq!(
            project(&state),
            Presentation::empty(core_library::render::NO_AUTHORS)
        );

        let state = update(&state, Message::SessionExpired);
        assert!(state.session_expired);
        assert_eq!(state.error.as_deref(), Some(SESSION_EXPIRED));
    }
}
