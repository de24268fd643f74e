//! # Catalog Sync Module
//!
//! Moves data between the backend and the in-memory catalog.
//!
//! ## Components
//!
//! - **Catalog API** (`api`): the REST endpoints behind the `CatalogApi` trait
//! - **Catalog Sync** (`coordinator`): generation-guarded full reloads of the
//!   book collection
//! - **Mutation Coordinator** (`mutation`): book create/update/delete/status,
//!   each followed by a reload
//! - **Author Coordinator** (`authors`): the same cycle for authors

pub mod api;
pub mod authors;
pub mod coordinator;
pub mod error;
pub mod mutation;

pub use api::{CatalogApi, RestCatalogApi, SearchQuery};
pub use authors::AuthorCoordinator;
pub use coordinator::{CatalogSync, ReloadOutcome};
pub use error::{Result, SyncError};
pub use mutation::{MutationCoordinator, MutationReport, Operation};
