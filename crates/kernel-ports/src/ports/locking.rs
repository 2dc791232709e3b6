//! Locking capabilities.

use std::sync::Arc;

/// Lock client owned by one transaction.
pub trait LockClient: Send + Sync {
    fn acquire_shared(&self, resource_id: u64);

    fn acquire_exclusive(&self, resource_id: u64);

    fn release_all(&self);

    fn active_lock_count(&self) -> usize;
}

/// Optimistic and pessimistic lock access for one statement.
pub trait StatementLocks: Send + Sync {
    fn optimistic(&self) -> Arc<dyn LockClient>;

    fn pessimistic(&self) -> Arc<dyn LockClient>;

    /// Called right before the owning transaction commits.
    fn prepare_for_commit(&self) {}
}

/// Creates statement locks for new transactions.
pub trait StatementLocksFactory: Send + Sync {
    fn new_instance(&self) -> Arc<dyn StatementLocks>;
}

/// Lock manager.
pub trait Locks: Send + Sync {
    fn new_client(&self) -> Arc<dyn LockClient>;

    fn close(&self) {}
}
