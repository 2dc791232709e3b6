//! Transaction stand-ins.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::config::{Config, READ_ONLY};
use crate::entities::AccessCapability;
use crate::ports::{
    CommitProcessFactory, CommitProcessKind, DatabaseEventHandlers, TransactionCounters,
    TransactionEventHandlers, VersionContext, VersionContextSupplier,
};

/// Counters that always read zero.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTransactionCounters;

impl TransactionCounters for NoopTransactionCounters {
    fn number_of_active_transactions(&self) -> u64 {
        0
    }

    fn number_of_started_transactions(&self) -> u64 {
        0
    }

    fn number_of_committed_transactions(&self) -> u64 {
        0
    }

    fn number_of_rolled_back_transactions(&self) -> u64 {
        0
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTransactionEventHandlers;

impl TransactionEventHandlers for NoopTransactionEventHandlers {
    fn before_commit(&self) {}

    fn after_commit(&self) {}

    fn has_handlers(&self) -> bool {
        false
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopDatabaseEventHandlers;

impl DatabaseEventHandlers for NoopDatabaseEventHandlers {
    fn on_start(&self, _database: &str) {}

    fn on_shutdown(&self, _database: &str) {}

    fn on_panic(&self, _database: &str, _cause: &str) {}
}

/// Direct commits unless the access capability or settings forbid writes.
#[derive(Debug, Clone, Copy, Default)]
pub struct CommunityCommitProcessFactory;

impl CommitProcessFactory for CommunityCommitProcessFactory {
    fn create(&self, access: AccessCapability, config: &Config) -> CommitProcessKind {
        let read_only_setting = matches!(config.get_bool(READ_ONLY), Ok(Some(true)));
        if !access.allows_writes() || read_only_setting {
            CommitProcessKind::ReadOnly
        } else {
            CommitProcessKind::Direct
        }
    }
}

/// Supplies contexts carrying the last closed transaction id.
#[derive(Debug, Default)]
pub struct TransactionVersionContextSupplier {
    last_closed_transaction_id: AtomicU64,
}

impl TransactionVersionContextSupplier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn transaction_closed(&self, transaction_id: u64) {
        self.last_closed_transaction_id
            .fetch_max(transaction_id, Ordering::SeqCst);
    }
}

impl VersionContextSupplier for TransactionVersionContextSupplier {
    fn create_version_context(&self) -> VersionContext {
        let last_closed = self.last_closed_transaction_id.load(Ordering::SeqCst);
        VersionContext {
            committing_transaction_id: last_closed + 1,
            last_closed_transaction_id: last_closed,
        }
    }

    fn tracks_versions(&self) -> bool {
        true
    }
}
