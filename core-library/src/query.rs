//! Filter/sort engine for the book collection.
//!
//! [`derive`] reads the authoritative collection and returns a fresh, filtered
//! and sorted `Vec`. It never writes back, so applying it again to the same
//! inputs yields the same sequence.
//!
//! ```
//! use core_library::models::{Book, BookStatus};
//! use core_library::query::{derive, SortKey, ViewState};
//!
//! let books = vec![
//!     Book::new(1, "Zeta", BookStatus::Available),
//!     Book::new(2, "Alpha", BookStatus::Issued),
//! ];
//! let view = ViewState::default().with_sort(Some(SortKey::Title));
//!
//! let titles: Vec<_> = derive(&books, &view).into_iter().map(|b| b.title).collect();
//! assert_eq!(titles, ["Alpha", "Zeta"]);
//! ```

use crate::error::{LibraryError, Result};
use crate::models::{Book, BookStatus};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Which circulation states the view keeps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    #[default]
    All,
    Available,
    Issued,
}

impl StatusFilter {
    pub fn matches(&self, book: &Book) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Available => book.status == BookStatus::Available,
            StatusFilter::Issued => book.status == BookStatus::Issued,
        }
    }

    /// The status this filter pins, if any.
    pub fn status(&self) -> Option<BookStatus> {
        match self {
            StatusFilter::All => None,
            StatusFilter::Available => Some(BookStatus::Available),
            StatusFilter::Issued => Some(BookStatus::Issued),
        }
    }
}

impl From<BookStatus> for StatusFilter {
    fn from(status: BookStatus) -> Self {
        match status {
            BookStatus::Available => StatusFilter::Available,
            BookStatus::Issued => StatusFilter::Issued,
        }
    }
}

impl FromStr for StatusFilter {
    type Err = LibraryError;

    /// `""` and `"all"` select everything.
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "all" => Ok(StatusFilter::All),
            "available" => Ok(StatusFilter::Available),
            "issued" => Ok(StatusFilter::Issued),
            _ => Err(LibraryError::Parse {
                kind: "status filter",
                value: s.to_string(),
            }),
        }
    }
}

/// Case-insensitive substring filters. Empty means "match everything".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextFilters {
    pub title: String,
    pub author: String,
    pub category: String,
}

impl TextFilters {
    pub fn is_empty(&self) -> bool {
        self.title.trim().is_empty()
            && self.author.trim().is_empty()
            && self.category.trim().is_empty()
    }

    fn folded(&self) -> FoldedFilters {
        FoldedFilters {
            title: fold(&self.title),
            author: fold(&self.author),
            category: fold(&self.category),
        }
    }

    pub fn matches(&self, book: &Book) -> bool {
        self.folded().matches(book)
    }
}

fn fold(filter: &str) -> Option<String> {
    let trimmed = filter.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_lowercase())
}

struct FoldedFilters {
    title: Option<String>,
    author: Option<String>,
    category: Option<String>,
}

impl FoldedFilters {
    fn matches(&self, book: &Book) -> bool {
        field_contains(Some(&book.title), &self.title)
            && field_contains(book.author_name.as_deref(), &self.author)
            && field_contains(book.category.as_deref(), &self.category)
    }
}

fn field_contains(field: Option<&str>, needle: &Option<String>) -> bool {
    match needle {
        None => true,
        Some(needle) => field.unwrap_or("").to_lowercase().contains(needle.as_str()),
    }
}

/// Sort orders offered by the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SortKey {
    Title,
    TitleDesc,
    Author,
    Category,
    Status,
}

impl SortKey {
    pub const ALL: [SortKey; 5] = [
        SortKey::Title,
        SortKey::TitleDesc,
        SortKey::Author,
        SortKey::Category,
        SortKey::Status,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::Title => "title",
            SortKey::TitleDesc => "title-desc",
            SortKey::Author => "author",
            SortKey::Category => "category",
            SortKey::Status => "status",
        }
    }

    /// Lenient parse used for UI input: anything unrecognised means "no sort".
    pub fn parse(s: &str) -> Option<SortKey> {
        let s = s.trim();
        SortKey::ALL
            .into_iter()
            .find(|key| key.as_str().eq_ignore_ascii_case(s))
    }

    pub fn compare(&self, a: &Book, b: &Book) -> Ordering {
        match self {
            SortKey::Title => collate(&a.title, &b.title),
            SortKey::TitleDesc => collate(&b.title, &a.title),
            SortKey::Author => collate(
                a.author_name.as_deref().unwrap_or(""),
                b.author_name.as_deref().unwrap_or(""),
            ),
            SortKey::Category => collate(
                a.category.as_deref().unwrap_or(""),
                b.category.as_deref().unwrap_or(""),
            ),
            SortKey::Status => collate(a.status.as_str(), b.status.as_str()),
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Case-aware collation: letters compare case-insensitively first, then a
/// lower-case letter sorts before the same letter in upper case.
pub fn collate(a: &str, b: &str) -> Ordering {
    let folded = |s: &str| s.chars().flat_map(char::to_lowercase).collect::<Vec<_>>();

    folded(a)
        .cmp(&folded(b))
        .then_with(|| {
            a.chars()
                .map(char::is_uppercase)
                .cmp(b.chars().map(char::is_uppercase))
        })
        .then_with(|| a.cmp(b))
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    #[default]
    List,
    Table,
}

impl FromStr for ViewMode {
    type Err = LibraryError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "list" => Ok(ViewMode::List),
            "table" => Ok(ViewMode::Table),
            _ => Err(LibraryError::Parse {
                kind: "view mode",
                value: s.to_string(),
            }),
        }
    }
}

/// Everything the user can adjust about the books view.
///
/// Defaults: all statuses, no text filters, server order, list view.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewState {
    pub status: StatusFilter,
    pub text: TextFilters,
    pub sort: Option<SortKey>,
    pub view_mode: ViewMode,
}

impl ViewState {
    pub fn with_status(mut self, status: StatusFilter) -> Self {
        self.status = status;
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.text.title = title.into();
        self
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.text.author = author.into();
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.text.category = category.into();
        self
    }

    pub fn with_sort(mut self, sort: Option<SortKey>) -> Self {
        self.sort = sort;
        self
    }

    pub fn with_view_mode(mut self, view_mode: ViewMode) -> Self {
        self.view_mode = view_mode;
        self
    }
}

/// Filter by status and text, then stable-sort by the view's key.
pub fn derive(records: &[Book], view: &ViewState) -> Vec<Book> {
    let text = view.text.folded();

    let mut derived: Vec<Book> = records
        .iter()
        .filter(|book| view.status.matches(book) && text.matches(book))
        .cloned()
        .collect();

    if let Some(key) = view.sort {
        derived.sort_by(|a, b| key.compare(a, b));
    }

    derived
}

/// The table only ever shows books that can be issued.
pub fn table_view(mut derived: Vec<Book>) -> Vec<Book> {
    derived.retain(Book::is_available);
    derived
}

/// `derive`, plus the table restriction when the view is in table mode.
pub fn visible(records: &[Book], view: &ViewState) -> Vec<Book> {
    let derived = derive(records, view);
    match view.view_mode {
        ViewMode::List => derived,
        ViewMode::Table => table_view(derived),
    }
}
