use jsonstore::collection::{AddOptions, ProvisionOptions, StoreCollection};
use jsonstore::errors::JsonStoreResult;
use jsonstore::JsonStore;
use serde_json::json;
use std::sync::atomic::{AtomicU64, Ordering};

static STORE_SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// A store opened for one test, with a unique name so parallel tests never
/// share a store-wide lock.
#[derive(Clone)]
pub struct TestContext {
    store: JsonStore,
}

impl TestContext {
    pub fn store(&self) -> JsonStore {
        self.store.clone()
    }
}

/// Opens a fresh store with a `customers` collection provisioned the way the
/// integration tests expect: `name` and `city` as strings, `age` as an
/// integer, plus an additional `ssn` search field.
pub fn create_test_context() -> JsonStoreResult<TestContext> {
    let sequence = STORE_SEQUENCE.fetch_add(1, Ordering::SeqCst);
    let store = JsonStore::builder()
        .store_name(&format!("int-test-{}", sequence))
        .open()?;
    store.open_collections(&[ProvisionOptions::new("customers")
        .search_field("name", "string")
        .search_field("age", "integer")
        .search_field("address.city", "string")
        .additional_search_field("ssn", "string")])?;
    Ok(TestContext { store })
}

/// Seeds the `customers` collection with three well-known documents, stored
/// clean (not dirty). Ids are assigned 1..=3 in order.
pub fn seed_customers(collection: &StoreCollection) -> JsonStoreResult<()> {
    collection.add_data(
        &[
            json!({"name": "carlos", "age": 25, "address": {"city": "Lisbon"}}),
            json!({"name": "mike", "age": 30, "address": {"city": "Austin"}}),
            json!({"name": "carla", "age": 40, "address": {"city": "Lisbon"}}),
        ],
        false,
        &AddOptions::new(),
    )?;
    Ok(())
}

/// Destroys the context's store, dropping every collection.
pub fn cleanup(ctx: TestContext) -> JsonStoreResult<()> {
    ctx.store().destroy()
}
