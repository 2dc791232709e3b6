//! # Ports (Driven Ports)
//!
//! Interfaces the kernel runtime requires its host to implement. Every trait
//! is object safe and `Send + Sync` so implementations can be shared as
//! `Arc<dyn Trait>` between the runtime and the test that built it.
//!
//! Production implementations live with the storage engine; the test fixture
//! falls back to the types in [`crate::stand_ins`].

pub mod ids;
pub mod io;
pub mod locking;
pub mod logging;
pub mod schema;
pub mod services;
pub mod time;
pub mod transactions;

pub use ids::{IdGenerator, IdGeneratorFactory, IdTypeConfigurationProvider};
pub use io::{DatabaseLayoutWatcher, FileSystemAbstraction, PageCache, WatcherServiceFactory};
pub use locking::{LockClient, Locks, StatementLocks, StatementLocksFactory};
pub use logging::{Log, LogProvider, LogService};
pub use schema::{
    ConstraintSemantics, IndexProvider, IndexProviderDescriptor, SchemaWriteGuard, TokenHolder,
    TokenHolders, TokenNameLookup,
};
pub use services::{
    select_storage_engine, DatabaseMigrator, DatabaseMigratorFactory, DiagnosticsManager,
    ExtensionFactory, GlobalProcedures, Job, JobHandle, JobScheduler, PanicEventGenerator,
    QueryEngineProvider, StorageEngineFactory,
};
pub use time::SystemNanoClock;
pub use transactions::{
    CommitProcessFactory, CommitProcessKind, DatabaseEventHandlers, TransactionCounters,
    TransactionEventHandlers, TransactionMonitor, VersionContext, VersionContextSupplier,
};
