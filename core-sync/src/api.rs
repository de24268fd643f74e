//! # Catalog API
//!
//! The backend's catalog endpoints behind the [`CatalogApi`] trait, with
//! [`RestCatalogApi`] as the implementation over the authenticated
//! [`ApiClient`].
//!
//! List endpoints answer 404 with `{"message": "No ... found"}` when nothing
//! matches. That is reported here as an empty list, not an error.

use async_trait::async_trait;
use bridge_traits::HttpMethod;
use core_auth::api_client::ack_message;
use core_auth::{ApiClient, ApiResult};
use core_library::{
    Author, AuthorDraft, AuthorId, Book, BookDraft, BookId, BookPatch, BookStatus, IssueRecord,
    User, UserId, ViewState,
};
use serde::de::DeserializeOwned;
use tracing::debug;

const SEARCH_PATH: &str = "/books/search";
const ANY_SEGMENT: &str = "all";

/// Server-side narrowing for `/books/search`.
///
/// The backend filters by title, category and status through path segments.
/// Author is accepted for symmetry with the view filters but has no segment
/// of its own.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchQuery {
    pub title: String,
    pub author: String,
    pub category: String,
    pub status: Option<BookStatus>,
}

impl SearchQuery {
    /// The query matching the view's status and text filters.
    pub fn from_view(view: &ViewState) -> Self {
        Self {
            title: view.text.title.clone(),
            author: view.text.author.clone(),
            category: view.text.category.clone(),
            status: view.status.status(),
        }
    }

    pub fn is_empty(&self) -> bool {
        trimmed(&self.title).is_none()
            && trimmed(&self.author).is_none()
            && trimmed(&self.category).is_none()
            && self.status.is_none()
    }

    /// `/books/search[/{title}[/{category}[/{status}]]]`, with `all` filling
    /// any gap before a later segment.
    pub fn path(&self) -> String {
        let mut path = SEARCH_PATH.to_string();
        if self.is_empty() {
            return path;
        }

        let title = trimmed(&self.title);
        let category = trimmed(&self.category);

        push_segment(&mut path, title.unwrap_or(ANY_SEGMENT));
        if category.is_some() || self.status.is_some() {
            push_segment(&mut path, category.unwrap_or(ANY_SEGMENT));
            if let Some(status) = self.status {
                push_segment(&mut path, status.as_str());
            }
        }
        path
    }
}

fn trimmed(value: &str) -> Option<&str> {
    let value = value.trim();
    (!value.is_empty()).then_some(value)
}

fn push_segment(path: &mut String, segment: &str) {
    path.push('/');
    path.push_str(&urlencoding::encode(segment));
}

/// Catalog endpoints used by the coordinators.
///
/// Mutations return the server's acknowledgement message when it sends one.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CatalogApi: Send + Sync {
    async fn search_books(&self, query: &SearchQuery) -> ApiResult<Vec<Book>>;

    async fn create_book(&self, draft: &BookDraft) -> ApiResult<Option<String>>;

    async fn update_book(&self, id: BookId, patch: &BookPatch) -> ApiResult<Option<String>>;

    async fn delete_book(&self, id: BookId) -> ApiResult<Option<String>>;

    async fn list_authors(&self) -> ApiResult<Vec<Author>>;

    async fn create_author(&self, draft: &AuthorDraft) -> ApiResult<Option<String>>;

    async fn update_author(&self, id: AuthorId, draft: &AuthorDraft) -> ApiResult<Option<String>>;

    async fn delete_author(&self, id: AuthorId) -> ApiResult<Option<String>>;

    async fn list_users(&self) -> ApiResult<Vec<User>>;

    /// All issue records, or those of one user.
    async fn list_issued(&self, user: Option<UserId>) -> ApiResult<Vec<IssueRecord>>;
}

/// [`CatalogApi`] over the REST backend.
#[derive(Clone)]
pub struct RestCatalogApi {
    client: ApiClient,
}

impl RestCatalogApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    async fn list<T: DeserializeOwned>(&self, path: &str) -> ApiResult<Vec<T>> {
        match self.client.get_json(path).await {
            Err(e) if e.is_not_found() => {
                debug!(path, "Nothing found, treating as empty");
                Ok(Vec::new())
            }
            other => other,
        }
    }

    async fn send<B: serde::Serialize + Sync>(
        &self,
        method: HttpMethod,
        path: &str,
        body: &B,
    ) -> ApiResult<Option<String>> {
        let response = self.client.send_json(method, path, body).await?;
        Ok(ack_message(&response))
    }

    async fn delete(&self, path: &str) -> ApiResult<Option<String>> {
        let response = self.client.request(path, HttpMethod::Delete, None).await?;
        Ok(ack_message(&response))
    }
}

#[async_trait]
impl CatalogApi for RestCatalogApi {
    async fn search_books(&self, query: &SearchQuery) -> ApiResult<Vec<Book>> {
        self.list(&query.path()).await
    }

    async fn create_book(&self, draft: &BookDraft) -> ApiResult<Option<String>> {
        self.send(HttpMethod::Post, "/books", draft).await
    }

    async fn update_book(&self, id: BookId, patch: &BookPatch) -> ApiResult<Option<String>> {
        self.send(HttpMethod::Put, &format!("/books/{}", id), patch)
            .await
    }

    async fn delete_book(&self, id: BookId) -> ApiResult<Option<String>> {
        self.delete(&format!("/books/{}", id)).await
    }

    async fn list_authors(&self) -> ApiResult<Vec<Author>> {
        self.list("/authors").await
    }

    async fn create_author(&self, draft: &AuthorDraft) -> ApiResult<Option<String>> {
        self.send(HttpMethod::Post, "/authors", draft).await
    }

    async fn update_author(&self, id: AuthorId, draft: &AuthorDraft) -> ApiResult<Option<String>> {
        self.send(HttpMethod::Put, &format!("/authors/{}", id), draft)
            .await
    }

    async fn delete_author(&self, id: AuthorId) -> ApiResult<Option<String>> {
        self.delete(&format!("/authors/{}", id)).await
    }

    async fn list_users(&self) -> ApiResult<Vec<User>> {
        self.list("/users").await
    }

    async fn list_issued(&self, user: Option<UserId>) -> ApiResult<Vec<IssueRecord>> {
        match user {
            Some(id) => self.list(&format!("/issued_books?user_id={}", id)).await,
            None => self.list("/issued_books").await,
        }
    }
}
