use crate::collection::default_store_collection::DefaultStoreCollection;
use crate::collection::{ProvisionOptions, StoreCollection};
use crate::common::{LockHandle, LockRegistry};
use crate::errors::{ErrorKind, JsonStoreError, JsonStoreResult};
use crate::json_store_builder::JsonStoreBuilder;
use crate::store::{StoreCoordinator, TransactionToken};
use dashmap::DashMap;
use std::sync::{Arc, OnceLock};

/// One lock per store name, shared by every `JsonStore` opened against it.
static LOCK_REGISTRY: OnceLock<LockRegistry> = OnceLock::new();

pub(crate) fn store_lock(name: &str) -> LockHandle {
    LOCK_REGISTRY
        .get_or_init(LockRegistry::new)
        .get_lock(name)
}

/// The main document store instance.
///
/// `JsonStore` is the entry point for all operations: it provisions
/// collections, hands out collection accessors, and scopes caller
/// transactions across every collection of the store.
///
/// `JsonStore` uses the PIMPL (Pointer to Implementation) design pattern
/// internally: clones share the same `Arc`'d state, so an instance can be
/// handed to multiple threads cheaply. The store-wide lock serializes the
/// actual storage work.
///
/// # Examples
///
/// ```rust,ignore
/// use jsonstore::JsonStore;
/// use jsonstore::collection::ProvisionOptions;
/// use serde_json::json;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let store = JsonStore::builder().store_name("app").open()?;
/// let collections = store.open_collections(&[
///     ProvisionOptions::new("people")
///         .search_field("name", "string")
///         .search_field("age", "integer"),
/// ])?;
///
/// let people = store.collection("people")?;
/// people.add_data(&[json!({"name": "carlos", "age": 99})], true, &Default::default())?;
///
/// store.close_all_collections()?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct JsonStore {
    inner: Arc<JsonStoreInner>,
}

impl JsonStore {
    /// Creates a new [`JsonStoreBuilder`] for configuring and opening a store.
    pub fn builder() -> JsonStoreBuilder {
        JsonStoreBuilder::new()
    }

    pub(crate) fn new(name: &str, coordinator: StoreCoordinator) -> JsonStore {
        let lock = store_lock(name);
        JsonStore {
            inner: Arc::new(JsonStoreInner {
                name: name.to_string(),
                coordinator,
                token: TransactionToken::new(),
                lock,
                collections: DashMap::new(),
            }),
        }
    }

    /// The store name this instance was opened with.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Provisions a batch of collections and returns their accessors.
    ///
    /// Provisioning an already-provisioned collection reopens it; existing
    /// documents and schema stay authoritative unless the options request a
    /// drop-and-recreate.
    pub fn open_collections(
        &self,
        options: &[ProvisionOptions],
    ) -> JsonStoreResult<Vec<StoreCollection>> {
        let _guard = self.inner.lock.acquire();
        self.ensure_open()?;

        let mut accessors = Vec::with_capacity(options.len());
        for collection_options in options {
            let was_reopened = self.inner.coordinator.provision(collection_options)?;
            let name = collection_options.collection_name();
            let accessor = StoreCollection::new(DefaultStoreCollection::new(
                name,
                self.inner.coordinator.clone(),
                self.inner.token.clone(),
                self.inner.lock.clone(),
                was_reopened,
            ));
            self.inner
                .collections
                .insert(name.to_string(), accessor.clone());
            accessors.push(accessor);
        }
        Ok(accessors)
    }

    /// Returns the accessor for a previously opened collection.
    pub fn collection(&self, name: &str) -> JsonStoreResult<StoreCollection> {
        self.ensure_open()?;
        match self.inner.collections.get(name) {
            Some(accessor) => Ok(accessor.clone()),
            None => {
                log::error!("Collection {} has not been opened on store {}", name, self.inner.name);
                Err(JsonStoreError::new(
                    &format!("Collection {} has not been opened", name),
                    ErrorKind::StoreNotOpen,
                ))
            }
        }
    }

    /// Starts a caller transaction spanning every collection of this store.
    ///
    /// While it is open, collection batch operations join it instead of
    /// opening implicit transactions of their own, and nothing is durable
    /// until [`Self::commit_transaction`].
    pub fn start_transaction(&self) -> JsonStoreResult<()> {
        let _guard = self.inner.lock.acquire();
        self.ensure_open()?;
        self.inner.coordinator.begin_transaction()?;
        self.inner.token.set_active(true);
        Ok(())
    }

    /// Commits the open caller transaction.
    pub fn commit_transaction(&self) -> JsonStoreResult<()> {
        let _guard = self.inner.lock.acquire();
        self.ensure_open()?;
        self.inner.coordinator.commit_transaction()?;
        self.inner.token.set_active(false);
        Ok(())
    }

    /// Rolls back the open caller transaction, restoring every collection to
    /// its state at [`Self::start_transaction`].
    pub fn rollback_transaction(&self) -> JsonStoreResult<()> {
        let _guard = self.inner.lock.acquire();
        self.ensure_open()?;
        self.inner.coordinator.rollback_transaction()?;
        self.inner.token.set_active(false);
        Ok(())
    }

    /// Returns whether a caller transaction is currently open.
    pub fn transaction_in_progress(&self) -> bool {
        self.inner.token.is_active()
    }

    /// Closes the store. Collection accessors become unusable; the documents
    /// themselves survive for the next open of the same backend.
    pub fn close_all_collections(&self) -> JsonStoreResult<()> {
        let _guard = self.inner.lock.acquire();
        self.inner.token.set_active(false);
        self.inner.collections.clear();
        self.inner.coordinator.close()
    }

    /// Drops every collection and closes the store. Fails while a caller
    /// transaction is open.
    pub fn destroy(&self) -> JsonStoreResult<()> {
        let _guard = self.inner.lock.acquire();
        if self.inner.token.is_active() {
            log::error!("Cannot destroy store {} while a transaction is in progress", self.inner.name);
            return Err(JsonStoreError::new(
                "Cannot destroy a store while a transaction is in progress",
                ErrorKind::TransactionConflict,
            ));
        }
        self.inner.collections.clear();
        self.inner.coordinator.destroy()
    }

    /// Returns whether the store is open.
    pub fn is_open(&self) -> bool {
        self.inner.coordinator.is_open()
    }

    fn ensure_open(&self) -> JsonStoreResult<()> {
        if !self.inner.coordinator.is_open() {
            log::error!("Store {} is not open", self.inner.name);
            return Err(JsonStoreError::new(
                &format!("Store {} is not open", self.inner.name),
                ErrorKind::StoreNotOpen,
            ));
        }
        Ok(())
    }
}

struct JsonStoreInner {
    name: String,
    coordinator: StoreCoordinator,
    token: TransactionToken,
    lock: LockHandle,
    collections: DashMap<String, StoreCollection>,
}

impl Drop for JsonStoreInner {
    fn drop(&mut self) {
        // release backend resources when the last clone goes away
        if self.coordinator.is_open() {
            if let Err(error) = self.coordinator.close() {
                log::error!("Failed to close store {} on drop: {}", self.name, error);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::AddOptions;
    use crate::query::{QueryOptions, SimpleQuery};
    use serde_json::json;

    fn open_store() -> JsonStore {
        let store = JsonStore::builder().store_name("test-store").open().unwrap();
        store
            .open_collections(&[ProvisionOptions::new("people")
                .search_field("name", "string")
                .search_field("age", "integer")])
            .unwrap();
        store
    }

    #[test]
    fn test_open_collections_returns_accessors() {
        let store = open_store();
        let people = store.collection("people").unwrap();
        assert_eq!(people.name(), "people");
        assert!(people.is_open());
        assert!(!people.was_reopened());
    }

    #[test]
    fn test_reprovision_reports_reopen() {
        let store = open_store();
        let accessors = store
            .open_collections(&[ProvisionOptions::new("people")
                .search_field("name", "string")
                .search_field("age", "integer")])
            .unwrap();
        assert!(accessors[0].was_reopened());
    }

    #[test]
    fn test_unopened_collection_fails() {
        let store = open_store();
        let result = store.collection("nowhere");
        assert_eq!(result.unwrap_err().kind(), &ErrorKind::StoreNotOpen);
    }

    #[test]
    fn test_transaction_spans_collections() {
        let store = JsonStore::builder().store_name("tx-store").open().unwrap();
        store
            .open_collections(&[
                ProvisionOptions::new("a").search_field("k", "string"),
                ProvisionOptions::new("b").search_field("k", "string"),
            ])
            .unwrap();
        let a = store.collection("a").unwrap();
        let b = store.collection("b").unwrap();

        store.start_transaction().unwrap();
        a.add_data(&[json!({"k": "1"})], false, &AddOptions::new()).unwrap();
        b.add_data(&[json!({"k": "2"})], false, &AddOptions::new()).unwrap();
        store.rollback_transaction().unwrap();

        assert_eq!(a.count_documents().unwrap(), 0);
        assert_eq!(b.count_documents().unwrap(), 0);
        assert!(!store.transaction_in_progress());
    }

    #[test]
    fn test_commit_makes_changes_durable() {
        let store = open_store();
        let people = store.collection("people").unwrap();
        store.start_transaction().unwrap();
        people
            .add_data(&[json!({"name": "kept", "age": 1})], false, &AddOptions::new())
            .unwrap();
        store.commit_transaction().unwrap();
        assert_eq!(people.count_documents().unwrap(), 1);
    }

    #[test]
    fn test_nested_transaction_conflicts() {
        let store = open_store();
        store.start_transaction().unwrap();
        let result = store.start_transaction();
        assert_eq!(result.unwrap_err().kind(), &ErrorKind::TransactionConflict);
        store.rollback_transaction().unwrap();
    }

    #[test]
    fn test_close_makes_accessors_unusable() {
        let store = open_store();
        let people = store.collection("people").unwrap();
        store.close_all_collections().unwrap();
        assert!(!store.is_open());
        assert!(!people.is_open());
        let result = people.find_with_queries(&[SimpleQuery::new()], &QueryOptions::new());
        assert_eq!(result.unwrap_err().kind(), &ErrorKind::StoreNotOpen);
    }

    #[test]
    fn test_destroy_conflicts_with_transaction() {
        let store = open_store();
        store.start_transaction().unwrap();
        assert_eq!(
            store.destroy().unwrap_err().kind(),
            &ErrorKind::TransactionConflict
        );
        store.rollback_transaction().unwrap();
        store.destroy().unwrap();
        assert!(!store.is_open());
    }

    #[test]
    fn test_reopen_collection_keeps_documents() {
        let store = open_store();
        let people = store.collection("people").unwrap();
        people
            .add_data(&[json!({"name": "stay", "age": 1})], false, &AddOptions::new())
            .unwrap();
        store
            .open_collections(&[ProvisionOptions::new("people")
                .search_field("name", "string")
                .search_field("age", "integer")])
            .unwrap();
        let people = store.collection("people").unwrap();
        assert_eq!(people.count_documents().unwrap(), 1);
    }
}
