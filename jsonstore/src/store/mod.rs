pub mod memory;
mod store_coordinator;

pub use store_coordinator::{StoreCoordinator, StoreCoordinatorProvider};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Token marking whether a caller-initiated transaction is open.
///
/// A clone is handed to every collection opened against one store. Batch
/// operations check it before opening their implicit transaction: while a
/// caller transaction is active, collection-internal operations never
/// start, commit, or roll back a nested one.
#[derive(Clone, Default)]
pub struct TransactionToken {
    active: Arc<AtomicBool>,
}

impl TransactionToken {
    pub fn new() -> TransactionToken {
        TransactionToken::default()
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    pub(crate) fn set_active(&self, active: bool) {
        self.active.store(active, Ordering::Release);
    }
}
