//! # Library Catalog Module
//!
//! Client-side model of the library catalog.
//!
//! ## Overview
//!
//! This module provides:
//! - Domain models for books, authors, users and issue records
//! - The [`CollectionStore`] holding the authoritative book collection
//! - The filter/sort engine ([`query::derive`]) over that collection
//! - The view renderer turning derived records into a [`Presentation`]

pub mod error;
pub mod models;
pub mod query;
pub mod render;
pub mod store;

pub use error::{LibraryError, Result};
pub use models::{
    Author, AuthorDraft, AuthorId, Book, BookDraft, BookId, BookPatch, BookStatus, IssueId,
    IssueRecord, IssueStatus, IssuedBookRef, User, UserId,
};
pub use query::{derive, table_view, visible, SortKey, StatusFilter, TextFilters, ViewMode, ViewState};
pub use render::{ActionKind, Presentation};
pub use store::CollectionStore;
