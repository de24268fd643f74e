//! View renderer: projects records into presentation data.
//!
//! Everything here is a pure transform. The UI layer (or the CLI's `Display`
//! output) decides how a [`Presentation`] is drawn; the renderer only decides
//! what is in it.

use crate::models::{Author, AuthorId, Book, BookId, BookStatus, IssueId, IssueRecord, User, UserId};
use crate::query::ViewMode;
use core_auth::Role;
use serde::Serialize;
use std::fmt;

pub const LOADING: &str = "Loading...";
pub const NO_BOOKS: &str = "No books found";
pub const NO_AUTHORS: &str = "No authors yet. Add one to get started!";
pub const NO_USERS: &str = "No users found";
pub const NO_ISSUED_BOOKS: &str = "No issued books found";
pub const NO_USER_ISSUES: &str = "No issued books for this user.";

const UNKNOWN: &str = "Unknown";

/// Per-record action offered by a row or card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    View,
    Issue,
    Return,
    Delete,
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::View => "view",
            ActionKind::Issue => "issue",
            ActionKind::Return => "return",
            ActionKind::Delete => "delete",
        }
    }

    /// `view` and `delete` always; `issue` or `return` depending on status.
    pub fn for_status(status: BookStatus) -> Vec<ActionKind> {
        let toggle = match status {
            BookStatus::Available => ActionKind::Issue,
            BookStatus::Issued => ActionKind::Return,
        };
        vec![ActionKind::View, toggle, ActionKind::Delete]
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookRow {
    pub id: BookId,
    pub title: String,
    pub author: String,
    pub category: String,
    pub status: BookStatus,
    pub actions: Vec<ActionKind>,
}

impl From<&Book> for BookRow {
    fn from(book: &Book) -> Self {
        Self {
            id: book.id,
            title: book.title.clone(),
            author: book.author_display().to_string(),
            category: book.category_display().to_string(),
            status: book.status,
            actions: ActionKind::for_status(book.status),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookCard {
    pub id: BookId,
    pub title: String,
    /// `(label, value)` pairs shown under the title.
    pub details: Vec<(&'static str, String)>,
    pub status: BookStatus,
    pub actions: Vec<ActionKind>,
}

impl From<&Book> for BookCard {
    fn from(book: &Book) -> Self {
        let mut details = vec![
            ("Author", book.author_display().to_string()),
            ("Category", book.category_display().to_string()),
            ("Status", book.status.label().to_string()),
        ];
        if let Some(isbn) = crate::models::non_blank(book.isbn.as_deref()) {
            details.push(("ISBN", isbn.to_string()));
        }
        if let Some(description) = crate::models::non_blank(book.description.as_deref()) {
            details.push(("Description", description.to_string()));
        }

        Self {
            id: book.id,
            title: book.title.clone(),
            details,
            status: book.status,
            actions: ActionKind::for_status(book.status),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthorCard {
    pub id: AuthorId,
    pub name: String,
    pub bio: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserRow {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub role: Role,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IssueRow {
    pub id: IssueId,
    pub book: String,
    pub issued_to: String,
    pub status: &'static str,
}

/// What a section shows.
///
/// Loading, empty and error placeholders are distinct variants so callers
/// never confuse "nothing loaded yet" with "nothing matched".
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "items", rename_all = "snake_case")]
pub enum Presentation {
    Loading,
    Empty { message: String },
    Error { message: String },
    BookList(Vec<BookCard>),
    BookTable(Vec<BookRow>),
    Authors(Vec<AuthorCard>),
    Users(Vec<UserRow>),
    Issued(Vec<IssueRow>),
}

impl Presentation {
    pub fn empty(message: impl Into<String>) -> Self {
        Presentation::Empty {
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Presentation::Error {
            message: message.into(),
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(
            self,
            Presentation::Loading | Presentation::Empty { .. } | Presentation::Error { .. }
        )
    }

    /// Every `(action, book)` pair offered by the rendered book rows or cards.
    pub fn book_actions(&self) -> Vec<(ActionKind, BookId)> {
        let expand = |id: BookId, actions: &[ActionKind]| {
            actions.iter().map(move |action| (*action, id)).collect::<Vec<_>>()
        };
        match self {
            Presentation::BookList(cards) => cards
                .iter()
                .flat_map(|card| expand(card.id, &card.actions))
                .collect(),
            Presentation::BookTable(rows) => rows
                .iter()
                .flat_map(|row| expand(row.id, &row.actions))
                .collect(),
            _ => Vec::new(),
        }
    }
}

/// Render an already-derived book sequence in the given mode.
///
/// The table lists available books only, whatever it is handed.
pub fn render_books(mode: ViewMode, books: &[Book]) -> Presentation {
    let rendered = match mode {
        ViewMode::List => Presentation::BookList(books.iter().map(BookCard::from).collect()),
        ViewMode::Table => Presentation::BookTable(
            books
                .iter()
                .filter(|book| book.is_available())
                .map(BookRow::from)
                .collect(),
        ),
    };
    match &rendered {
        Presentation::BookList(cards) if cards.is_empty() => Presentation::empty(NO_BOOKS),
        Presentation::BookTable(rows) if rows.is_empty() => Presentation::empty(NO_BOOKS),
        _ => rendered,
    }
}

pub fn render_authors(authors: &[Author]) -> Presentation {
    if authors.is_empty() {
        return Presentation::empty(NO_AUTHORS);
    }
    Presentation::Authors(
        authors
            .iter()
            .map(|author| AuthorCard {
                id: author.id,
                name: author.name.clone(),
                bio: author.bio_display().to_string(),
            })
            .collect(),
    )
}

pub fn render_users(users: &[User]) -> Presentation {
    if users.is_empty() {
        return Presentation::empty(NO_USERS);
    }
    Presentation::Users(
        users
            .iter()
            .map(|user| UserRow {
                id: user.id,
                name: user.name.clone(),
                email: user.email.clone(),
                role: user.role,
            })
            .collect(),
    )
}

pub fn render_issued(records: &[IssueRecord]) -> Presentation {
    render_issue_rows(records, NO_ISSUED_BOOKS)
}

/// Issue records filtered to one user.
pub fn render_user_issues(records: &[IssueRecord]) -> Presentation {
    render_issue_rows(records, NO_USER_ISSUES)
}

fn render_issue_rows(records: &[IssueRecord], empty: &str) -> Presentation {
    if records.is_empty() {
        return Presentation::empty(empty);
    }
    Presentation::Issued(
        records
            .iter()
            .map(|record| IssueRow {
                id: record.id,
                book: or_unknown(record.book_title.as_deref()),
                issued_to: or_unknown(record.user_name.as_deref()),
                status: record.status.label(),
            })
            .collect(),
    )
}

fn or_unknown(value: Option<&str>) -> String {
    crate::models::non_blank(value).unwrap_or(UNKNOWN).to_string()
}

// =============================================================================
// Plain-text layout
// =============================================================================

fn write_table(f: &mut fmt::Formatter<'_>, headers: &[&str], rows: &[Vec<String>]) -> fmt::Result {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    write_row(f, &widths, headers.iter().copied())?;
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    write_row(f, &widths, rule.iter().map(String::as_str))?;
    for row in rows {
        write_row(f, &widths, row.iter().map(String::as_str))?;
    }
    Ok(())
}

fn write_row<'a>(
    f: &mut fmt::Formatter<'_>,
    widths: &[usize],
    cells: impl Iterator<Item = &'a str>,
) -> fmt::Result {
    let line = cells
        .zip(widths)
        .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
        .collect::<Vec<_>>()
        .join("  ");
    writeln!(f, "{}", line.trim_end())
}

fn actions_cell(actions: &[ActionKind]) -> String {
    actions
        .iter()
        .map(ActionKind::as_str)
        .collect::<Vec<_>>()
        .join(" ")
}

impl fmt::Display for Presentation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Presentation::Loading => writeln!(f, "{}", LOADING),
            Presentation::Empty { message } => writeln!(f, "{}", message),
            Presentation::Error { message } => writeln!(f, "Error: {}", message),
            Presentation::BookTable(rows) => {
                let cells: Vec<Vec<String>> = rows
                    .iter()
                    .map(|row| {
                        vec![
                            row.id.to_string(),
                            row.title.clone(),
                            row.author.clone(),
                            row.category.clone(),
                            row.status.label().to_string(),
                            actions_cell(&row.actions),
                        ]
                    })
                    .collect();
                write_table(
                    f,
                    &["ID", "Title", "Author", "Category", "Status", "Actions"],
                    &cells,
                )
            }
            Presentation::BookList(cards) => {
                for (i, card) in cards.iter().enumerate() {
                    if i > 0 {
                        writeln!(f)?;
                    }
                    writeln!(f, "[{}] {}", card.id, card.title)?;
                    for (label, value) in &card.details {
                        writeln!(f, "    {}: {}", label, value)?;
                    }
                    writeln!(f, "    Actions: {}", actions_cell(&card.actions))?;
                }
                Ok(())
            }
            Presentation::Authors(cards) => {
                for (i, card) in cards.iter().enumerate() {
                    if i > 0 {
                        writeln!(f)?;
                    }
                    writeln!(f, "[{}] {}", card.id, card.name)?;
                    writeln!(f, "    {}", card.bio)?;
                }
                Ok(())
            }
            Presentation::Users(rows) => {
                let cells: Vec<Vec<String>> = rows
                    .iter()
                    .map(|row| {
                        vec![
                            row.id.to_string(),
                            row.name.clone(),
                            row.email.clone(),
                            row.role.to_string(),
                        ]
                    })
                    .collect();
                write_table(f, &["User ID", "Name", "Email", "Role"], &cells)
            }
            Presentation::Issued(rows) => {
                let cells: Vec<Vec<String>> = rows
                    .iter()
                    .map(|row| {
                        vec![
                            row.id.to_string(),
                            row.book.clone(),
                            row.issued_to.clone(),
                            row.status.to_string(),
                        ]
                    })
                    .collect();
                write_table(f, &["Issue ID", "Book", "Issued To", "Status"], &cells)
            }
        }
    }
}
