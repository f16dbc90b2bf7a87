use crate::errors::{ErrorKind, JsonStoreError, JsonStoreResult};
use crate::json_store::JsonStore;
use crate::store::memory::InMemoryCoordinator;
use crate::store::StoreCoordinator;

/// Builder for creating and opening a [`JsonStore`] instance.
///
/// Follows the builder pattern and captures configuration errors so they are
/// propagated when opening the store, keeping the fluent chain infallible.
///
/// # Examples
///
/// ```rust,ignore
/// use jsonstore::JsonStore;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let store = JsonStore::builder()
///     .store_name("app")
///     .open()?;
/// # Ok(())
/// # }
/// ```
pub struct JsonStoreBuilder {
    error: Option<JsonStoreError>,
    store_name: String,
    coordinator: Option<StoreCoordinator>,
}

impl JsonStoreBuilder {
    /// Creates a builder with default configuration: the default store name
    /// and the in-memory backend.
    pub fn new() -> JsonStoreBuilder {
        JsonStoreBuilder {
            error: None,
            store_name: "jsonstore".to_string(),
            coordinator: None,
        }
    }

    /// Sets the store name. Stores with the same name share one store-wide
    /// lock, so two instances over the same backing data serialize properly.
    ///
    /// An empty name is captured as an error and returned by [`Self::open`].
    pub fn store_name(mut self, store_name: &str) -> JsonStoreBuilder {
        if self.error.is_none() {
            if store_name.trim().is_empty() {
                log::error!("Store name must not be empty");
                self.error = Some(JsonStoreError::new(
                    "Store name must not be empty",
                    ErrorKind::PersistentStoreFailure,
                ));
            } else {
                self.store_name = store_name.to_string();
            }
        }
        self
    }

    /// Uses a custom storage backend instead of the default in-memory one.
    pub fn coordinator(mut self, coordinator: StoreCoordinator) -> JsonStoreBuilder {
        if self.error.is_none() {
            self.coordinator = Some(coordinator);
        }
        self
    }

    /// Opens the store, reporting any error captured while configuring.
    pub fn open(self) -> JsonStoreResult<JsonStore> {
        if let Some(error) = self.error {
            return Err(error);
        }
        let coordinator = self
            .coordinator
            .unwrap_or_else(|| StoreCoordinator::new(InMemoryCoordinator::new()));
        Ok(JsonStore::new(&self.store_name, coordinator))
    }
}

impl Default for JsonStoreBuilder {
    fn default() -> Self {
        Self::new()
    }
}
