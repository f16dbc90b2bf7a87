use parking_lot::{Mutex, MutexGuard};
use std::collections::HashMap;
use std::sync::Arc;

/// A handle to a store-wide mutual-exclusion lock that can be stored and
/// reused.
///
/// Every store-touching collection operation acquires this lock for its full
/// duration. The underlying persistence engine is not safe for concurrent
/// access, so reads are serialized along with writes. The guard is scoped, so
/// the lock is released on every exit path, including early returns on error.
#[derive(Clone)]
pub struct LockHandle {
    lock: Arc<Mutex<()>>,
}

impl LockHandle {
    /// Creates a new lock handle.
    pub fn new() -> Self {
        LockHandle {
            lock: Arc::new(Mutex::new(())),
        }
    }

    /// Acquires the lock, blocking the calling thread until it is available.
    pub fn acquire(&self) -> MutexGuard<'_, ()> {
        self.lock.lock()
    }
}

impl Default for LockHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// Registry for managing named store locks.
///
/// Each opened store gets exactly one lock, shared by all collections opened
/// against it; the registry hands out clones of the same handle for the same
/// name. This implementation uses `parking_lot`'s poison-free locks.
///
/// # Examples
///
/// ```
/// use jsonstore::common::LockRegistry;
/// let lock_registry = LockRegistry::new();
/// let lock = lock_registry.get_lock("store1");
/// {
///     let _guard = lock.acquire();
/// } // lock is held while _guard is in scope
/// ```
#[derive(Clone)]
pub struct LockRegistry {
    locks: Arc<Mutex<HashMap<String, LockHandle>>>,
}

impl LockRegistry {
    /// Creates a new empty lock registry.
    pub fn new() -> Self {
        LockRegistry {
            locks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Gets the lock for the given store name, creating it if absent.
    ///
    /// Repeated calls with the same name return handles to the same lock.
    pub fn get_lock(&self, name: &str) -> LockHandle {
        let mut locks = self.locks.lock();
        locks
            .entry(name.to_string())
            .or_insert_with(LockHandle::new)
            .clone()
    }

    /// Removes a lock from the registry if it is no longer needed.
    ///
    /// Returns `true` if the lock was removed, `false` if it did not exist.
    pub fn remove_lock(&self, name: &str) -> bool {
        let mut locks = self.locks.lock();
        locks.remove(name).is_some()
    }

    /// Returns the number of locks currently registered.
    pub fn lock_count(&self) -> usize {
        let locks = self.locks.lock();
        locks.len()
    }
}

impl Default for LockRegistry {
    fn default() -> Self {
        Self::new()
    }
}
