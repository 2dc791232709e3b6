//! Lock stand-ins that never block.

use std::sync::Arc;

use crate::ports::{LockClient, Locks, StatementLocks, StatementLocksFactory};

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopLockClient;

impl LockClient for NoopLockClient {
    fn acquire_shared(&self, _resource_id: u64) {}

    fn acquire_exclusive(&self, _resource_id: u64) {}

    fn release_all(&self) {}

    fn active_lock_count(&self) -> usize {
        0
    }
}

/// Statement locks where optimistic and pessimistic access share one client.
#[derive(Clone)]
pub struct SharedClientStatementLocks {
    client: Arc<dyn LockClient>,
}

impl SharedClientStatementLocks {
    pub fn new(client: Arc<dyn LockClient>) -> Self {
        Self { client }
    }
}

impl StatementLocks for SharedClientStatementLocks {
    fn optimistic(&self) -> Arc<dyn LockClient> {
        Arc::clone(&self.client)
    }

    fn pessimistic(&self) -> Arc<dyn LockClient> {
        Arc::clone(&self.client)
    }
}

/// Hands out [`SharedClientStatementLocks`] over a fresh no-op client.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandInStatementLocksFactory;

impl StatementLocksFactory for StandInStatementLocksFactory {
    fn new_instance(&self) -> Arc<dyn StatementLocks> {
        Arc::new(SharedClientStatementLocks::new(Arc::new(NoopLockClient)))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopLocks;

impl Locks for NoopLocks {
    fn new_client(&self) -> Arc<dyn LockClient> {
        Arc::new(NoopLockClient)
    }
}
