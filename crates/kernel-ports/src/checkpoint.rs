//! Mutual exclusion between store copy and checkpointing.
//!
//! Any number of store copies may run at once; a checkpoint excludes them all.

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Debug, Default)]
pub struct StoreCopyCheckPointMutex {
    lock: RwLock<()>,
}

impl StoreCopyCheckPointMutex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn store_copy(&self) -> RwLockReadGuard<'_, ()> {
        self.lock.read()
    }

    pub fn checkpoint(&self) -> RwLockWriteGuard<'_, ()> {
        self.lock.write()
    }

    /// Checkpoint only if no store copy is running.
    pub fn try_checkpoint(&self) -> Option<RwLockWriteGuard<'_, ()>> {
        self.lock.try_write()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_copy_blocks_checkpoint() {
        let mutex = StoreCopyCheckPointMutex::new();

        let copy = mutex.store_copy();
        assert!(mutex.try_checkpoint().is_none());

        drop(copy);
        assert!(mutex.try_checkpoint().is_some());
    }
}
