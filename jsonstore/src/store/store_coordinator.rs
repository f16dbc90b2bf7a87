use crate::collection::{AddOptions, Document, DocumentOperation, ProvisionOptions};
use crate::errors::JsonStoreResult;
use crate::query::{QueryOptions, QueryPart, SimpleQuery};
use serde_json::Value;
use std::ops::Deref;
use std::sync::Arc;

/// Low-level interface to the relational persistence engine.
///
/// # Purpose
/// Defines the contract a storage backend must implement for the document
/// layer: materialize a table per collection with one queryable column per
/// declared search field, execute compiled queries, track per-row dirty
/// state, and provide transaction primitives.
///
/// # Key Responsibilities
/// - **Row storage**: store, replace, soft/hard delete documents
/// - **Query execution**: simple queries and compiled operator predicates
/// - **Dirty tracking**: dirty counts, dirty listings, mark-clean
/// - **Transactions**: begin/commit/rollback over all tables of one store
/// - **Lifecycle**: provision, drop, clear, close, destroy
///
/// The original engine signalled an unexecutable query with a null result
/// (distinct from an empty one); implementations here signal it with `Err`,
/// which the collection layer maps to an invalid-search-field failure.
///
/// # Thread Safety
/// Implementers must be `Send + Sync`. They may assume calls are serialized
/// by the store-wide lock and need not be internally transactional beyond the
/// explicit transaction primitives.
pub trait StoreCoordinatorProvider: Send + Sync {
    /// Provisions the table backing a collection.
    ///
    /// Creates the table and one indexed column per schema path. When a table
    /// for the collection already exists it is reopened, unless
    /// `options.drop_first` requests a drop-and-recreate.
    ///
    /// # Returns
    /// * `Ok(true)` if an existing table was found and reopened
    /// * `Ok(false)` if a fresh table was created
    fn provision(&self, options: &ProvisionOptions) -> JsonStoreResult<bool>;

    /// Stores one document, extracting its index values through the
    /// collection schema and merging `additional` search-field values.
    ///
    /// Assigns the next identifier in the collection's sequence. With
    /// `mark_dirty` the row is created dirty with an `Insert` operation tag.
    fn store_object(
        &self,
        collection: &str,
        data: &Value,
        mark_dirty: bool,
        additional: &AddOptions,
    ) -> JsonStoreResult<()>;

    /// Removes the documents matching `document` (by id when present,
    /// otherwise by its scalar fields, exact or fuzzy).
    ///
    /// With `soft` the rows stay in the table, marked dirty with a `Delete`
    /// operation tag, and disappear from queries; otherwise they are erased.
    ///
    /// # Returns
    /// The number of rows affected.
    fn remove(
        &self,
        collection: &str,
        document: &Value,
        soft: bool,
        exact: bool,
    ) -> JsonStoreResult<i64>;

    /// Replaces the payload of the row identified by `document`'s id and
    /// re-extracts its index values.
    fn replace(&self, collection: &str, document: &Document, mark_dirty: bool)
        -> JsonStoreResult<()>;

    /// Executes one simple query.
    ///
    /// # Returns
    /// Matching documents in wire form (`{"_id", "json"}`), or the projection
    /// requested by `options.filter`. Soft-deleted rows never match.
    fn find(
        &self,
        collection: &str,
        query: &SimpleQuery,
        options: &QueryOptions,
    ) -> JsonStoreResult<Vec<Value>>;

    /// Executes compiled advanced query parts, AND'd together.
    fn find_with_query_parts(
        &self,
        collection: &str,
        parts: &[QueryPart],
        options: &QueryOptions,
    ) -> JsonStoreResult<Vec<Value>>;

    /// Counts all live documents in the collection.
    fn count(&self, collection: &str) -> JsonStoreResult<i64>;

    /// Counts the documents matching a simple query.
    fn count_with_query(
        &self,
        collection: &str,
        query: &SimpleQuery,
        exact: bool,
    ) -> JsonStoreResult<i64>;

    /// Counts the dirty documents in the collection.
    fn dirty_count(&self, collection: &str) -> JsonStoreResult<i64>;

    /// Returns whether the document with the given id is dirty.
    /// Unknown ids are not dirty.
    fn is_dirty(&self, collection: &str, id: i64) -> JsonStoreResult<bool>;

    /// Returns every dirty document in wire form, including soft-deleted
    /// rows awaiting a sync push.
    fn all_dirty_in_collection(&self, collection: &str) -> JsonStoreResult<Vec<Value>>;

    /// Clears the dirty flag of one document. When the tracked operation was
    /// `Delete` the row is purged permanently.
    fn mark_clean(
        &self,
        collection: &str,
        id: i64,
        operation: DocumentOperation,
    ) -> JsonStoreResult<()>;

    /// Drops the table backing the collection.
    fn drop_table(&self, collection: &str) -> JsonStoreResult<()>;

    /// Deletes all documents while keeping the table and its schema.
    fn clear_table(&self, collection: &str) -> JsonStoreResult<()>;

    /// Begins a transaction spanning all tables of this store.
    /// Fails if a transaction is already open.
    fn begin_transaction(&self) -> JsonStoreResult<()>;

    /// Commits the open transaction. Fails if none is open.
    fn commit_transaction(&self) -> JsonStoreResult<()>;

    /// Rolls back the open transaction. Fails if none is open.
    fn rollback_transaction(&self) -> JsonStoreResult<()>;

    /// Returns whether the store is open.
    fn is_open(&self) -> bool;

    /// Closes the store. Further operations fail with a store-not-open
    /// condition at the collection layer.
    fn close(&self) -> JsonStoreResult<()>;

    /// Drops all tables and closes the store.
    fn destroy(&self) -> JsonStoreResult<()>;
}

/// High-level handle to a store coordinator.
///
/// Wraps a concrete [`StoreCoordinatorProvider`] in an `Arc` so the same
/// backend can be shared by the store facade and every collection accessor.
/// Cloning is cheap and `Deref` exposes the provider methods directly.
#[derive(Clone)]
pub struct StoreCoordinator {
    inner: Arc<dyn StoreCoordinatorProvider>,
}

impl StoreCoordinator {
    /// Creates a new `StoreCoordinator` from a provider implementation.
    pub fn new<T: StoreCoordinatorProvider + 'static>(inner: T) -> Self {
        StoreCoordinator {
            inner: Arc::new(inner),
        }
    }
}

impl Deref for StoreCoordinator {
    type Target = Arc<dyn StoreCoordinatorProvider>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}
