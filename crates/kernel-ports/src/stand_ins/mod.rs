//! # Stand-ins
//!
//! No-op and in-memory implementations of the ports. They are the defaults a
//! test fixture registers for any capability the test did not supply, and
//! building blocks for tests that want to observe a single collaborator.
//!
//! Nothing here touches the host file system or spawns threads.

pub mod io;
pub mod locking;
pub mod logging;
pub mod schema;
pub mod services;
pub mod time;
pub mod transactions;

pub use io::{
    noop_watcher_service_factory, EphemeralFileSystem, EphemeralPageCache, NoopLayoutWatcher,
};
pub use locking::{
    NoopLockClient, NoopLocks, SharedClientStatementLocks, StandInStatementLocksFactory,
};
pub use logging::{NullLog, NullLogProvider, SimpleLogService, TracingLogProvider};
pub use schema::{
    stand_in_token_holders, AllowAllSchemaWriteGuard, EmptyIndexProvider,
    FormattingTokenNameLookup, InMemoryTokenHolder, StandardConstraintSemantics,
};
pub use services::{
    available_storage_engines, GraphDatabaseFacade, InMemoryGlobalProcedures,
    InMemoryStorageEngineFactory, ManualJobScheduler, NoopDatabaseMigrator,
    NoopDatabaseMigratorFactory, NoopDiagnosticsManager, NoopPanicEventGenerator,
};
pub use time::{FakeClock, SystemClock};
pub use transactions::{
    CommunityCommitProcessFactory, NoopDatabaseEventHandlers, NoopTransactionCounters,
    NoopTransactionEventHandlers, TransactionVersionContextSupplier,
};
