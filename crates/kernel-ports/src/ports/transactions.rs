//! Transaction monitoring, event handling and commit processing.

use crate::config::Config;
use crate::entities::AccessCapability;

/// Receives transaction lifecycle notifications.
pub trait TransactionMonitor: Send + Sync {
    fn transaction_started(&self);

    fn transaction_finished(&self, committed: bool, write: bool);

    fn transaction_terminated(&self);

    /// A read transaction became a write transaction.
    fn upgrade_to_write_transaction(&self);
}

/// Read side of transaction statistics.
pub trait TransactionCounters: Send + Sync {
    fn number_of_active_transactions(&self) -> u64;

    fn number_of_started_transactions(&self) -> u64;

    fn number_of_committed_transactions(&self) -> u64;

    fn number_of_rolled_back_transactions(&self) -> u64;
}

/// Hooks run around every commit.
pub trait TransactionEventHandlers: Send + Sync {
    fn before_commit(&self);

    fn after_commit(&self);

    fn has_handlers(&self) -> bool;
}

/// Hooks run on database lifecycle events.
pub trait DatabaseEventHandlers: Send + Sync {
    fn on_start(&self, database: &str);

    fn on_shutdown(&self, database: &str);

    fn on_panic(&self, database: &str, cause: &str);
}

/// Commit path selected for a database.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitProcessKind {
    /// Append to the transaction log and apply to the store.
    Direct,
    /// Every commit is rejected.
    ReadOnly,
}

pub trait CommitProcessFactory: Send + Sync {
    fn create(&self, access: AccessCapability, config: &Config) -> CommitProcessKind;
}

/// Snapshot of transaction ids used for versioned reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VersionContext {
    pub committing_transaction_id: u64,
    pub last_closed_transaction_id: u64,
}

pub trait VersionContextSupplier: Send + Sync {
    fn create_version_context(&self) -> VersionContext;

    /// Whether contexts carry real version information.
    fn tracks_versions(&self) -> bool;
}
