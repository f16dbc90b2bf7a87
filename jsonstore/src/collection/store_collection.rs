use crate::collection::{AddOptions, ChangeOptions, RemoveOptions};
use crate::errors::JsonStoreResult;
use crate::query::{QueryOptions, QueryPart, SimpleQuery};
use serde_json::Value;
use std::ops::Deref;
use std::sync::Arc;

/// Interface for a document collection.
///
/// # Purpose
/// A collection is the caller-facing unit of storage: a named set of JSON
/// documents with declared search fields, offline change tracking, and the
/// batch write operations a sync layer drives.
///
/// # Key Responsibilities
/// - **Writes**: `add_data`, `replace_documents`, `change_data`, `remove`
/// - **Reads**: simple queries, id lookups, advanced operator queries, counts
/// - **Change tracking**: dirty counts, dirty listings, mark-clean
/// - **Lifecycle**: clear, drop, open/closed state
///
/// # Failure semantics
/// The batch operations differ deliberately:
/// - `add_data` and `replace_documents` run inside an implicit transaction
///   (suppressed while a caller transaction is open); `replace_documents`
///   stops at the first failing document and rolls the whole batch back.
/// - `change_data` scopes an implicit transaction around each input
///   separately: a failing input fails the call but earlier inputs stay
///   applied.
/// - `remove` and `mark_documents_clean` are not transactional: they process
///   every input and report the subset that failed via
///   [`crate::errors::JsonStoreError::failures`], leaving successful inputs
///   applied.
pub trait StoreCollectionProvider: Send + Sync {
    /// The collection name as provisioned.
    fn name(&self) -> String;

    /// Whether provisioning found and reopened an existing table for this
    /// collection, rather than creating a fresh one.
    fn was_reopened(&self) -> bool;

    /// Stores a batch of documents, assigning each a fresh identifier.
    ///
    /// With `mark_dirty` the new documents are tracked as local inserts.
    /// Runs in an implicit transaction; any failure rolls back the batch.
    ///
    /// # Returns
    /// The number of documents stored.
    fn add_data(
        &self,
        data: &[Value],
        mark_dirty: bool,
        options: &AddOptions,
    ) -> JsonStoreResult<i64>;

    /// Finds the union of documents matching any of the given queries.
    ///
    /// Each query element runs with the full options (pagination included)
    /// and the accumulated results are deduplicated. An empty query slice
    /// matches nothing; an empty query element matches every document.
    fn find_with_queries(
        &self,
        queries: &[SimpleQuery],
        options: &QueryOptions,
    ) -> JsonStoreResult<Vec<Value>>;

    /// Finds the documents with the given identifiers, in input order.
    /// Unknown ids are silently absent from the result.
    fn find_with_ids(&self, ids: &[i64]) -> JsonStoreResult<Vec<Value>>;

    /// Finds the documents matching every one of the given advanced query
    /// parts.
    fn find_with_advanced_query(
        &self,
        parts: &[QueryPart],
        options: &QueryOptions,
    ) -> JsonStoreResult<Vec<Value>>;

    /// Returns all documents in the collection.
    fn find_all(&self, options: &QueryOptions) -> JsonStoreResult<Vec<Value>>;

    /// Counts all documents in the collection.
    fn count_documents(&self) -> JsonStoreResult<i64>;

    /// Counts the documents matching a simple query.
    fn count_with_query(&self, query: &SimpleQuery, exact: bool) -> JsonStoreResult<i64>;

    /// Counts the documents with local changes not yet marked clean.
    fn count_all_dirty_documents(&self) -> JsonStoreResult<i64>;

    /// Returns whether the given document (by its `_id`) has local changes.
    /// Documents without an `_id` were never stored and are never dirty.
    fn is_dirty_document(&self, document: &Value) -> JsonStoreResult<bool>;

    /// Lists dirty documents in wire form, including their operation tags.
    ///
    /// With a non-empty `documents` slice, only the dirty subset of those
    /// documents is returned; otherwise every dirty document is.
    fn all_dirty_with_documents(&self, documents: &[Value]) -> JsonStoreResult<Vec<Value>>;

    /// Clears the dirty state of the given documents after a successful sync
    /// push. Soft-deleted documents are purged for good.
    ///
    /// Not transactional: failures are collected per document and reported
    /// together, without undoing the documents already marked.
    ///
    /// # Returns
    /// The number of documents marked clean.
    fn mark_documents_clean(&self, documents: &[Value]) -> JsonStoreResult<i64>;

    /// Removes the given documents, resolving each by `_id` when present and
    /// by field matching otherwise.
    ///
    /// Not transactional: failures are collected per document and reported
    /// together, without undoing the documents already removed.
    ///
    /// # Returns
    /// The total number of documents removed.
    fn remove(&self, documents: &[Value], options: &RemoveOptions) -> JsonStoreResult<i64>;

    /// Replaces the payloads of the given documents, resolved by `_id`.
    ///
    /// Runs in an implicit transaction and stops at the first document that
    /// fails, rolling back the whole batch; the error carries that document.
    ///
    /// # Returns
    /// The number of documents replaced.
    fn replace_documents(&self, documents: &[Value], mark_dirty: bool) -> JsonStoreResult<i64>;

    /// Upserts a batch of documents against the replace criteria.
    ///
    /// For each input, every criteria field present in the input becomes one
    /// exact single-field query; documents matching any of those queries are
    /// replaced with the input payload. Inputs matching nothing are added
    /// when `options.add_new` is set, dropped otherwise. Each input is
    /// processed independently, so earlier inputs stay applied when a later
    /// one fails.
    ///
    /// # Returns
    /// The number of documents replaced or added.
    fn change_data(&self, data: &[Value], options: &ChangeOptions) -> JsonStoreResult<i64>;

    /// Deletes every document while keeping the collection provisioned.
    fn clear_collection(&self) -> JsonStoreResult<()>;

    /// Drops the collection and its table. Fails while a caller transaction
    /// is open. The accessor is unusable afterwards.
    fn remove_collection(&self) -> JsonStoreResult<()>;

    /// Returns whether the collection can still serve operations.
    fn is_open(&self) -> bool;
}

/// Handle to a document collection.
///
/// Wraps a provider in an `Arc`; clones share the same underlying collection
/// and `Deref` exposes the provider methods directly.
///
/// # Examples
///
/// ```rust,ignore
/// use serde_json::json;
///
/// let people = store.collection("people")?;
/// people.add_data(&[json!({"name": "carlos", "age": 99})], true, &Default::default())?;
/// ```
#[derive(Clone)]
pub struct StoreCollection {
    inner: Arc<dyn StoreCollectionProvider>,
}

impl std::fmt::Debug for StoreCollection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreCollection")
            .field("name", &self.inner.name())
            .finish()
    }
}

impl StoreCollection {
    pub(crate) fn new<T: StoreCollectionProvider + 'static>(inner: T) -> Self {
        StoreCollection {
            inner: Arc::new(inner),
        }
    }
}

impl Deref for StoreCollection {
    type Target = Arc<dyn StoreCollectionProvider>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}
