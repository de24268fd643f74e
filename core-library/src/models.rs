//! Domain models for the library catalog
//!
//! Records mirror the backend's JSON. Drafts and patches are the request
//! bodies for create and update, with validation run before anything is sent.

use crate::error::{LibraryError, Result};
use core_auth::Role;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// =============================================================================
// ID Types
// =============================================================================

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }
    };
}

id_type!(
    /// Server-assigned book identifier
    BookId
);
id_type!(
    /// Server-assigned author identifier
    AuthorId
);
id_type!(
    /// Server-assigned account identifier
    UserId
);
id_type!(
    /// Identifier of an issue record (one loan)
    IssueId
);

// =============================================================================
// Books
// =============================================================================

pub const UNKNOWN_AUTHOR: &str = "Unknown";
pub const OTHER_CATEGORY: &str = "Other";

/// Circulation state. Moves `Available -> Issued` on issue and back on return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookStatus {
    Available,
    Issued,
}

impl BookStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookStatus::Available => "available",
            BookStatus::Issued => "issued",
        }
    }

    /// Badge text shown in lists and tables.
    pub fn label(&self) -> &'static str {
        match self {
            BookStatus::Available => "Available",
            BookStatus::Issued => "Issued",
        }
    }
}

impl fmt::Display for BookStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookStatus {
    type Err = LibraryError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "available" => Ok(BookStatus::Available),
            "issued" => Ok(BookStatus::Issued),
            _ => Err(LibraryError::Parse {
                kind: "book status",
                value: s.to_string(),
            }),
        }
    }
}

/// A book as returned by `/books/search`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub id: BookId,
    pub title: String,
    #[serde(default)]
    pub author_id: Option<AuthorId>,
    #[serde(default)]
    pub author_name: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    pub status: BookStatus,
    #[serde(default)]
    pub isbn: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl Book {
    /// Minimal record, mostly for tests and fixtures.
    pub fn new(id: i64, title: impl Into<String>, status: BookStatus) -> Self {
        Self {
            id: BookId(id),
            title: title.into(),
            author_id: None,
            author_name: None,
            category: None,
            status,
            isbn: None,
            description: None,
        }
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author_name = Some(author.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn is_available(&self) -> bool {
        self.status == BookStatus::Available
    }

    /// Author name, or `"Unknown"` when absent or blank.
    pub fn author_display(&self) -> &str {
        non_blank(self.author_name.as_deref()).unwrap_or(UNKNOWN_AUTHOR)
    }

    /// Category, or `"Other"` when absent or blank.
    pub fn category_display(&self) -> &str {
        non_blank(self.category.as_deref()).unwrap_or(OTHER_CATEGORY)
    }
}

pub(crate) fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

/// Body of `POST /books`. The backend requires title, category, author and ISBN.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookDraft {
    pub title: String,
    pub category: String,
    pub author_id: AuthorId,
    pub isbn: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<BookStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl BookDraft {
    pub fn new(
        title: impl Into<String>,
        category: impl Into<String>,
        author_id: AuthorId,
        isbn: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into().trim().to_string(),
            category: category.into().trim().to_string(),
            author_id,
            isbn: isbn.into().trim().to_string(),
            status: None,
            description: None,
        }
    }

    pub fn with_status(mut self, status: BookStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(LibraryError::invalid("title", "Title is required"));
        }
        if self.category.trim().is_empty() {
            return Err(LibraryError::invalid("category", "Category is required"));
        }
        if self.author_id.0 <= 0 {
            return Err(LibraryError::invalid(
                "author_id",
                "Author id must be a positive number",
            ));
        }
        if self.isbn.trim().is_empty() {
            return Err(LibraryError::invalid("isbn", "ISBN is required"));
        }
        Ok(())
    }
}

/// Body of `PUT /books/{id}`. Only the fields that are set are sent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BookPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_id: Option<AuthorId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub isbn: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<BookStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl BookPatch {
    /// The patch used by issue and return.
    pub fn status(status: BookStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn validate(&self) -> Result<()> {
        if self.is_empty() {
            return Err(LibraryError::invalid("patch", "Nothing to update"));
        }
        if matches!(&self.title, Some(title) if title.trim().is_empty()) {
            return Err(LibraryError::invalid("title", "Title cannot be blank"));
        }
        if matches!(self.author_id, Some(AuthorId(id)) if id <= 0) {
            return Err(LibraryError::invalid(
                "author_id",
                "Author id must be a positive number",
            ));
        }
        Ok(())
    }
}

// =============================================================================
// Authors
// =============================================================================

pub const NO_BIOGRAPHY: &str = "No biography added";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub id: AuthorId,
    pub name: String,
    #[serde(default)]
    pub bio: Option<String>,
}

impl Author {
    pub fn bio_display(&self) -> &str {
        non_blank(self.bio.as_deref()).unwrap_or(NO_BIOGRAPHY)
    }
}

/// Body of `POST /authors` and `PUT /authors/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthorDraft {
    pub name: String,
    pub bio: String,
}

impl AuthorDraft {
    pub fn new(name: impl Into<String>, bio: Option<String>) -> Self {
        Self {
            name: name.into().trim().to_string(),
            bio: bio.map(|b| b.trim().to_string()).unwrap_or_default(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(LibraryError::invalid("name", "Author name is required"));
        }
        Ok(())
    }
}

// =============================================================================
// Users and issue records
// =============================================================================

/// Loan reference embedded in a user record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuedBookRef {
    pub id: IssueId,
    #[serde(default)]
    pub book_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub issued_books: Vec<IssuedBookRef>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueStatus {
    Issued,
    Returned,
}

impl IssueStatus {
    /// There is no due date, so an open loan is always "Active".
    pub fn label(&self) -> &'static str {
        match self {
            IssueStatus::Issued => "Active",
            IssueStatus::Returned => "Returned",
        }
    }
}

/// One loan as returned by `/issued_books`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueRecord {
    pub id: IssueId,
    pub book_id: BookId,
    #[serde(default)]
    pub book_title: Option<String>,
    pub user_id: UserId,
    #[serde(default)]
    pub user_name: Option<String>,
    pub status: IssueStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_bare_integers() {
        let user: UserId = serde_json::from_str("5").unwrap();
        assert_eq!(user, UserId::from(5));
        assert_eq!(user.to_string(), "5");
        assert_eq!(serde_json::to_string(&IssueId(10)).unwrap(), "10");
    }

    #[test]
    fn test_book_from_backend_json() {
        let json = r#"{"id": 3, "title": "Dune", "category": "Sci-Fi",
                       "status": "issued", "author_id": 2, "author_name": null}"#;
        let book: Book = serde_json::from_str(json).unwrap();

        assert_eq!(book.id, BookId(3));
        assert_eq!(book.status, BookStatus::Issued);
        assert_eq!(book.author_id, Some(AuthorId(2)));
        assert_eq!(book.author_display(), UNKNOWN_AUTHOR);
        assert_eq!(book.category_display(), "Sci-Fi");
        assert!(book.isbn.is_none());
    }

    #[test]
    fn test_unknown_status_is_rejected() {
        let json = r#"{"id": 1, "title": "X", "status": "lost"}"#;
        assert!(serde_json::from_str::<Book>(json).is_err());
        assert!("lost".parse::<BookStatus>().is_err());
        assert_eq!("Issued".parse::<BookStatus>().unwrap(), BookStatus::Issued);
    }

    #[test]
    fn test_fallbacks_for_blank_fields() {
        let book = Book::new(1, "Untitled", BookStatus::Available)
            .with_author("  ")
            .with_category("");
        assert_eq!(book.author_display(), "Unknown");
        assert_eq!(book.category_display(), "Other");
    }

    #[test]
    fn test_draft_validation() {
        assert!(BookDraft::new("Dune", "Sci-Fi", AuthorId(2), "978-0441013593")
            .validate()
            .is_ok());

        let cases = [
            (BookDraft::new(" ", "Sci-Fi", AuthorId(2), "1"), "title"),
            (BookDraft::new("Dune", "", AuthorId(2), "1"), "category"),
            (BookDraft::new("Dune", "Sci-Fi", AuthorId(0), "1"), "author_id"),
            (BookDraft::new("Dune", "Sci-Fi", AuthorId(2), "  "), "isbn"),
        ];
        for (draft, expected) in cases {
            match draft.validate() {
                Err(LibraryError::InvalidInput { field, .. }) => assert_eq!(field, expected),
                other => panic!("expected {} error, got {:?}", expected, other),
            }
        }
    }

    #[test]
    fn test_draft_serialization_skips_unset() {
        let draft = BookDraft::new("Dune", "Sci-Fi", AuthorId(2), "123");
        let json = serde_json::to_value(&draft).unwrap();
        assert_eq!(json["author_id"], 2);
        assert!(json.get("status").is_none());
        assert!(json.get("description").is_none());
    }

    #[test]
    fn test_patch_validation_and_shape() {
        let patch = BookPatch::status(BookStatus::Issued);
        assert!(patch.validate().is_ok());
        assert_eq!(
            serde_json::to_string(&patch).unwrap(),
            r#"{"status":"issued"}"#
        );

        assert!(BookPatch::default().validate().is_err());

        let blank_title = BookPatch {
            title: Some("   ".to_string()),
            ..BookPatch::default()
        };
        assert!(blank_title.validate().is_err());
    }

    #[test]
    fn test_author_bio_fallback() {
        let author: Author = serde_json::from_str(r#"{"id": 1, "name": "Le Guin", "bio": ""}"#).unwrap();
        assert_eq!(author.bio_display(), NO_BIOGRAPHY);

        assert!(AuthorDraft::new("  ", None).validate().is_err());
        assert_eq!(AuthorDraft::new("Le Guin", None).bio, "");
    }

    #[test]
    fn test_user_and_issue_records() {
        let user: User = serde_json::from_str(
            r#"{"id": 5, "name": "Ada", "email": "ada@example.com", "role": "admin",
                "issued_books": [{"id": 9, "book_name": "Dune"}]}"#,
        )
        .unwrap();
        assert_eq!(user.role, Role::Admin);
        assert_eq!(user.issued_books.len(), 1);

        let issue: IssueRecord = serde_json::from_str(
            r#"{"id": 9, "book_id": 3, "book_title": "Dune", "user_id": 5,
                "user_name": "Ada", "status": "returned"}"#,
        )
        .unwrap();
        assert_eq!(issue.status.label(), "Returned");
        assert_eq!(IssueStatus::Issued.label(), "Active");
    }
}
