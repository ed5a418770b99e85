//! Repository trait definition.

use super::filter::Filter;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use uuid::Uuid;

/// Store operation result.
pub type StoreResult<T> = Result<T, StoreError>;

/// Caller-side refusal raised inside an atomic store operation.
pub type Rejection = Box<dyn std::error::Error + Send + Sync>;

/// Edit applied to one document while the collection is locked for writing.
/// The slice holds the other documents that matched the peer filter.
pub type Mutation<'a, T> = Box<dyn FnOnce(&mut T, &[T]) -> Result<(), Rejection> + Send + 'a>;

/// Guard evaluated against the matching documents before an insert.
pub type Check<'a, T> = Box<dyn FnOnce(&[T]) -> Result<(), Rejection> + Send + 'a>;

/// Store errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{collection} document {id} not found")]
    NotFound { collection: &'static str, id: Uuid },
    #[error("duplicate {field} in {collection}: {value}")]
    Duplicate {
        collection: &'static str,
        field: String,
        value: String,
    },
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("{0}")]
    Rejected(Rejection),
}

/// Bookkeeping fields carried by every document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentMeta {
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DocumentMeta {
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// Bump `updatedAt`.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

impl Default for DocumentMeta {
    fn default() -> Self {
        Self::new()
    }
}

/// A record persisted in a collection.
pub trait Document: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Collection name, also used in not-found messages.
    const COLLECTION: &'static str;

    /// Primary key.
    fn key(&self) -> Uuid;

    fn meta(&self) -> &DocumentMeta;

    fn meta_mut(&mut self) -> &mut DocumentMeta;

    fn is_active(&self) -> bool {
        self.meta().is_active
    }
}

/// Result ordering by creation time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    NewestFirst,
    OldestFirst,
}

/// Options for [`Repository::find`].
#[derive(Debug, Clone, Copy, Default)]
pub struct FindOptions {
    pub skip: usize,
    pub limit: Option<usize>,
    pub sort: SortOrder,
}

impl FindOptions {
    /// Page window, 1-indexed.
    pub fn page(page: u32, limit: u32) -> Self {
        Self {
            skip: (page.saturating_sub(1) as usize) * limit as usize,
            limit: Some(limit as usize),
            sort: SortOrder::NewestFirst,
        }
    }

    pub fn sorted(mut self, sort: SortOrder) -> Self {
        self.sort = sort;
        self
    }
}

/// Typed collection of documents.
#[async_trait]
pub trait Repository<T: Document>: Send + Sync {
    /// Insert a new document. Fails on unique-field collisions.
    async fn insert(&self, doc: T) -> StoreResult<T>;

    /// Fetch by primary key, regardless of `isActive`.
    async fn get(&self, id: Uuid) -> StoreResult<Option<T>>;

    /// First document matching the filter (by sort order).
    async fn find_one(&self, filter: &Filter) -> StoreResult<Option<T>>;

    /// All documents matching the filter, windowed by `options`.
    async fn find(&self, filter: &Filter, options: FindOptions) -> StoreResult<Vec<T>>;

    /// Number of documents matching the filter.
    async fn count(&self, filter: &Filter) -> StoreResult<u64>;

    /// Insert `doc` if `check` accepts the documents matching `peers`.
    /// No other writer can touch the collection in between.
    async fn insert_checked(&self, doc: T, peers: &Filter, check: Check<'_, T>) -> StoreResult<T>;

    /// Load the document matching `filter`, apply `mutate` and write it back
    /// as one step, bumping `updatedAt`. When `peers` is given, the other
    /// documents it matches are handed to `mutate` as well.
    ///
    /// Returns `None` when nothing matches. A rejection leaves the document
    /// untouched.
    async fn update_with(
        &self,
        filter: &Filter,
        peers: Option<&Filter>,
        mutate: Mutation<'_, T>,
    ) -> StoreResult<Option<T>>;

    /// Mark a document inactive. Returns false if it was already inactive.
    async fn soft_delete(&self, id: Uuid) -> StoreResult<bool>;

    /// Page of matches together with the total match count.
    async fn find_page(&self, filter: &Filter, options: FindOptions) -> StoreResult<(Vec<T>, u64)> {
        let total = self.count(filter).await?;
        let items = self.find(filter, options).await?;
        Ok((items, total))
    }
}
