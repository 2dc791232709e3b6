//! Scheduler, procedures, migration, storage engine and facade stand-ins.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};

use crate::config::Config;
use crate::entities::DatabaseLayout;
use crate::errors::PortError;
use crate::ports::{
    DatabaseMigrator, DatabaseMigratorFactory, DiagnosticsManager, FileSystemAbstraction,
    GlobalProcedures, Job, JobHandle, JobScheduler, Log, PanicEventGenerator,
    StorageEngineFactory,
};

struct ScheduledJob {
    handle: JobHandle,
    group: String,
    job: Job,
}

/// Scheduler that never runs anything on its own.
///
/// Jobs run only when a test calls [`ManualJobScheduler::run_all`].
#[derive(Default)]
pub struct ManualJobScheduler {
    next_id: AtomicU64,
    jobs: Mutex<Vec<ScheduledJob>>,
}

impl ManualJobScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run every live job once. Returns how many ran.
    pub fn run_all(&self) -> usize {
        let runnable: Vec<Job> = {
            let mut jobs = self.jobs.lock();
            jobs.retain(|j| !j.handle.is_cancelled());
            jobs.iter().map(|j| Arc::clone(&j.job)).collect()
        };
        for job in &runnable {
            job();
        }
        runnable.len()
    }

    /// Groups of the live jobs, in scheduling order.
    pub fn scheduled_groups(&self) -> Vec<String> {
        self.jobs
            .lock()
            .iter()
            .filter(|j| !j.handle.is_cancelled())
            .map(|j| j.group.clone())
            .collect()
    }
}

impl JobScheduler for ManualJobScheduler {
    fn schedule_recurring(&self, group: &str, _period: Duration, job: Job) -> JobHandle {
        let handle = JobHandle::new(self.next_id.fetch_add(1, Ordering::SeqCst));
        self.jobs.lock().push(ScheduledJob {
            handle: handle.clone(),
            group: group.to_string(),
            job,
        });
        handle
    }

    fn active_job_count(&self) -> usize {
        self.jobs
            .lock()
            .iter()
            .filter(|j| !j.handle.is_cancelled())
            .count()
    }
}

#[derive(Debug, Default)]
pub struct InMemoryGlobalProcedures {
    names: RwLock<BTreeSet<String>>,
}

impl InMemoryGlobalProcedures {
    pub fn new() -> Self {
        Self::default()
    }
}

impl GlobalProcedures for InMemoryGlobalProcedures {
    fn register(&self, name: &str) {
        self.names.write().insert(name.to_string());
    }

    fn procedure_names(&self) -> Vec<String> {
        self.names.read().iter().cloned().collect()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopDatabaseMigrator;

impl DatabaseMigrator for NoopDatabaseMigrator {
    fn migrate(&self, _layout: &DatabaseLayout) -> Result<(), PortError> {
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopDatabaseMigratorFactory;

impl DatabaseMigratorFactory for NoopDatabaseMigratorFactory {
    fn create_database_migrator(
        &self,
        _layout: &DatabaseLayout,
        _config: &Config,
    ) -> Arc<dyn DatabaseMigrator> {
        Arc::new(NoopDatabaseMigrator)
    }
}

/// Storage engine whose store is a single metadata file.
#[derive(Debug, Clone)]
pub struct InMemoryStorageEngineFactory {
    name: String,
    priority: i32,
}

impl InMemoryStorageEngineFactory {
    pub const METADATA_FILE: &'static str = "metadatastore";

    pub fn new(name: impl Into<String>, priority: i32) -> Self {
        Self {
            name: name.into(),
            priority,
        }
    }
}

impl StorageEngineFactory for InMemoryStorageEngineFactory {
    fn name(&self) -> &str {
        &self.name
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    fn store_exists(&self, fs: &dyn FileSystemAbstraction, layout: &DatabaseLayout) -> bool {
        fs.file_exists(&layout.database_directory().join(Self::METADATA_FILE))
    }
}

/// Storage engines known to this build.
pub fn available_storage_engines() -> Vec<Arc<dyn StorageEngineFactory>> {
    vec![Arc::new(InMemoryStorageEngineFactory::new("in-memory", 0))]
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopDiagnosticsManager;

impl DiagnosticsManager for NoopDiagnosticsManager {
    fn dump_all(&self, _log: &dyn Log) {}
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopPanicEventGenerator;

impl PanicEventGenerator for NoopPanicEventGenerator {
    fn generate_event(&self, _cause: &str) {}
}

/// Public entry point of a database, bound to a name once the runtime starts.
#[derive(Debug, Default)]
pub struct GraphDatabaseFacade {
    database_name: RwLock<Option<String>>,
}

impl GraphDatabaseFacade {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn init(&self, database_name: &str) {
        *self.database_name.write() = Some(database_name.to_string());
    }

    pub fn database_name(&self) -> Option<String> {
        self.database_name.read().clone()
    }

    pub fn is_initialized(&self) -> bool {
        self.database_name.read().is_some()
    }
}
