//! Scheduling, procedures, migration, storage engines and diagnostics.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::entities::DatabaseLayout;
use crate::errors::PortError;
use crate::ports::io::FileSystemAbstraction;
use crate::ports::logging::Log;

/// A recurring or one-shot unit of background work.
pub type Job = Arc<dyn Fn() + Send + Sync>;

/// Handle returned for a scheduled job.
#[derive(Debug, Clone)]
pub struct JobHandle {
    id: u64,
    cancelled: Arc<AtomicBool>,
}

impl JobHandle {
    pub fn new(id: u64) -> Self {
        Self {
            id,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Prevent further runs. Safe to call more than once.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Runs background jobs on behalf of kernel components.
pub trait JobScheduler: Send + Sync {
    fn schedule_recurring(&self, group: &str, period: Duration, job: Job) -> JobHandle;

    /// Jobs scheduled and not yet cancelled.
    fn active_job_count(&self) -> usize;
}

/// Registry of callable procedures.
pub trait GlobalProcedures: Send + Sync {
    fn register(&self, name: &str);

    fn procedure_names(&self) -> Vec<String>;
}

/// Query engine implementation offered to the runtime.
pub trait QueryEngineProvider: Send + Sync {
    fn name(&self) -> &str;

    fn priority(&self) -> i32;
}

/// Factory for a kernel extension.
pub trait ExtensionFactory: Send + Sync {
    fn key(&self) -> &str;
}

/// Brings an existing store up to the current format.
pub trait DatabaseMigrator: Send + Sync {
    fn migrate(&self, layout: &DatabaseLayout) -> Result<(), PortError>;
}

pub trait DatabaseMigratorFactory: Send + Sync {
    fn create_database_migrator(
        &self,
        layout: &DatabaseLayout,
        config: &Config,
    ) -> Arc<dyn DatabaseMigrator>;
}

/// A storage engine implementation the runtime can open stores with.
pub trait StorageEngineFactory: Send + Sync {
    fn name(&self) -> &str;

    /// Higher wins during selection.
    fn priority(&self) -> i32;

    fn store_exists(&self, fs: &dyn FileSystemAbstraction, layout: &DatabaseLayout) -> bool;
}

/// Pick the storage engine to use among the available ones.
///
/// The highest priority wins; ties go to the lexicographically smallest name
/// so selection does not depend on discovery order.
pub fn select_storage_engine(
    candidates: Vec<Arc<dyn StorageEngineFactory>>,
) -> Result<Arc<dyn StorageEngineFactory>, PortError> {
    candidates
        .into_iter()
        .max_by(|a, b| {
            a.priority()
                .cmp(&b.priority())
                .then_with(|| b.name().cmp(a.name()))
        })
        .ok_or(PortError::NoStorageEngine)
}

/// Dumps diagnostic information about the database.
pub trait DiagnosticsManager: Send + Sync {
    fn dump_all(&self, log: &dyn Log);
}

/// Publishes an event when the database panics.
pub trait PanicEventGenerator: Send + Sync {
    fn generate_event(&self, cause: &str);
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Engine(&'static str, i32);

    impl StorageEngineFactory for Engine {
        fn name(&self) -> &str {
            self.0
        }

        fn priority(&self) -> i32 {
            self.1
        }

        fn store_exists(&self, _fs: &dyn FileSystemAbstraction, _layout: &DatabaseLayout) -> bool {
            false
        }
    }

    #[test]
    fn test_select_storage_engine_prefers_priority() {
        let engines: Vec<Arc<dyn StorageEngineFactory>> = vec![
            Arc::new(Engine("record", 1)),
            Arc::new(Engine("columnar", 5)),
        ];

        let selected = select_storage_engine(engines).unwrap();

        assert_eq!(selected.name(), "columnar");
    }

    #[test]
    fn test_select_storage_engine_breaks_ties_by_name() {
        let engines: Vec<Arc<dyn StorageEngineFactory>> =
            vec![Arc::new(Engine("zeta", 1)), Arc::new(Engine("alpha", 1))];

        let selected = select_storage_engine(engines).unwrap();

        assert_eq!(selected.name(), "alpha");
    }

    #[test]
    fn test_select_storage_engine_fails_when_empty() {
        let result = select_storage_engine(Vec::new());

        assert!(matches!(result, Err(PortError::NoStorageEngine)));
    }

    #[test]
    fn test_job_handle_cancel_is_shared_between_clones() {
        let handle = JobHandle::new(7);
        let clone = handle.clone();

        clone.cancel();

        assert!(handle.is_cancelled());
        assert_eq!(handle.id(), 7);
    }
}
