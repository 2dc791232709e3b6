//! # Id Generation
//!
//! ```text
//! BufferedIdController ──schedules──▶ maintenance()
//!          │
//!          ▼
//! BufferingIdGeneratorFactory ──wraps──▶ DefaultIdGeneratorFactory
//!   (holds freed ids back until           (high ids persisted as
//!    reuse is safe)                         <store>.id files)
//! ```
//!
//! Freed ids are buffered instead of being handed out again at once, so a
//! reader that still sees an old record cannot observe its id being reused.
//! The controller releases buffered ids on each maintenance run when the
//! configured [`IdReuseEligibility`] allows it.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use tracing::debug;

use crate::entities::{DatabaseLayout, IdReuseEligibility, IdType, IdTypeConfiguration};
use crate::errors::PortError;
use crate::ports::{
    FileSystemAbstraction, IdGenerator, IdGeneratorFactory, IdTypeConfigurationProvider,
    JobHandle, JobScheduler,
};

// =============================================================================
// In-memory generator
// =============================================================================

/// Generator keeping its free list in memory.
#[derive(Debug)]
pub struct InMemoryIdGenerator {
    id_type: IdType,
    high_id: AtomicU64,
    free_ids: Mutex<Vec<u64>>,
}

impl InMemoryIdGenerator {
    pub fn new(id_type: IdType, high_id: u64) -> Self {
        Self {
            id_type,
            high_id: AtomicU64::new(high_id),
            free_ids: Mutex::new(Vec::new()),
        }
    }
}

impl IdGenerator for InMemoryIdGenerator {
    fn id_type(&self) -> IdType {
        self.id_type
    }

    fn next_id(&self) -> u64 {
        if let Some(id) = self.free_ids.lock().pop() {
            return id;
        }
        self.high_id.fetch_add(1, Ordering::SeqCst)
    }

    fn free_id(&self, id: u64) {
        self.free_ids.lock().push(id);
    }

    fn high_id(&self) -> u64 {
        self.high_id.load(Ordering::SeqCst)
    }
}

// =============================================================================
// File-backed factory
// =============================================================================

/// Opens generators whose high id is stored in the layout's id files.
pub struct DefaultIdGeneratorFactory {
    fs: Arc<dyn FileSystemAbstraction>,
    generators: RwLock<HashMap<IdType, Arc<InMemoryIdGenerator>>>,
}

impl DefaultIdGeneratorFactory {
    pub fn new(fs: Arc<dyn FileSystemAbstraction>) -> Self {
        Self {
            fs,
            generators: RwLock::new(HashMap::new()),
        }
    }

    /// Write the current high id of every open generator to its id file.
    pub fn flush(&self, layout: &DatabaseLayout) -> Result<(), PortError> {
        for (id_type, generator) in self.generators.read().iter() {
            let path = layout.id_file(*id_type);
            self.fs.write_all(&path, &generator.high_id().to_le_bytes())?;
        }
        Ok(())
    }

    fn read_high_id(&self, layout: &DatabaseLayout, id_type: IdType) -> Result<u64, PortError> {
        let path = layout.id_file(id_type);
        if !self.fs.file_exists(&path) {
            self.fs.mkdirs(&layout.database_directory())?;
            self.fs.write_all(&path, &0u64.to_le_bytes())?;
            return Ok(0);
        }

        let bytes = self.fs.read_all(&path)?;
        let raw: [u8; 8] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| {
                PortError::io(&path, format!("expected 8 bytes, found {}", bytes.len()))
            })?;
        Ok(u64::from_le_bytes(raw))
    }
}

impl IdGeneratorFactory for DefaultIdGeneratorFactory {
    fn open(
        &self,
        layout: &DatabaseLayout,
        id_type: IdType,
        _configuration: IdTypeConfiguration,
    ) -> Result<Arc<dyn IdGenerator>, PortError> {
        if let Some(existing) = self.generators.read().get(&id_type) {
            return Ok(existing.clone());
        }

        let high_id = self.read_high_id(layout, id_type)?;
        let generator = Arc::new(InMemoryIdGenerator::new(id_type, high_id));
        self.generators.write().insert(id_type, Arc::clone(&generator));
        debug!(?id_type, high_id, "Opened id generator");
        Ok(generator)
    }

    fn get(&self, id_type: IdType) -> Option<Arc<dyn IdGenerator>> {
        self.generators
            .read()
            .get(&id_type)
            .map(|g| Arc::clone(g) as Arc<dyn IdGenerator>)
    }
}

// =============================================================================
// Per-type configuration
// =============================================================================

/// Community edition tuning: only schema and token ids are reused aggressively.
#[derive(Debug, Clone, Copy, Default)]
pub struct CommunityIdTypeConfigurationProvider;

impl IdTypeConfigurationProvider for CommunityIdTypeConfigurationProvider {
    fn configuration(&self, id_type: IdType) -> IdTypeConfiguration {
        let allow_aggressive_reuse = matches!(
            id_type,
            IdType::Schema
                | IdType::LabelToken
                | IdType::RelationshipTypeToken
                | IdType::PropertyKeyToken
        );
        IdTypeConfiguration {
            allow_aggressive_reuse,
            grab_size: if allow_aggressive_reuse { 1 } else { 1024 },
        }
    }
}

// =============================================================================
// Buffering
// =============================================================================

/// Holds freed ids back until [`BufferingIdGenerator::maintenance`] runs.
pub struct BufferingIdGenerator {
    delegate: Arc<dyn IdGenerator>,
    buffered: Mutex<Vec<u64>>,
}

impl BufferingIdGenerator {
    pub fn new(delegate: Arc<dyn IdGenerator>) -> Self {
        Self {
            delegate,
            buffered: Mutex::new(Vec::new()),
        }
    }

    pub fn buffered_count(&self) -> usize {
        self.buffered.lock().len()
    }

    /// Release buffered ids to the delegate. Returns how many were released.
    pub fn maintenance(&self) -> usize {
        let released: Vec<u64> = std::mem::take(&mut *self.buffered.lock());
        for id in &released {
            self.delegate.free_id(*id);
        }
        released.len()
    }
}

impl IdGenerator for BufferingIdGenerator {
    fn id_type(&self) -> IdType {
        self.delegate.id_type()
    }

    fn next_id(&self) -> u64 {
        self.delegate.next_id()
    }

    fn free_id(&self, id: u64) {
        self.buffered.lock().push(id);
    }

    fn high_id(&self) -> u64 {
        self.delegate.high_id()
    }
}

/// Wraps generators of aggressively reused id types in a buffer.
pub struct BufferingIdGeneratorFactory {
    delegate: Arc<dyn IdGeneratorFactory>,
    eligibility: IdReuseEligibility,
    configuration_provider: Arc<dyn IdTypeConfigurationProvider>,
    buffered: RwLock<HashMap<IdType, Arc<BufferingIdGenerator>>>,
}

impl BufferingIdGeneratorFactory {
    pub fn new(
        delegate: Arc<dyn IdGeneratorFactory>,
        eligibility: IdReuseEligibility,
        configuration_provider: Arc<dyn IdTypeConfigurationProvider>,
    ) -> Self {
        Self {
            delegate,
            eligibility,
            configuration_provider,
            buffered: RwLock::new(HashMap::new()),
        }
    }

    pub fn eligibility(&self) -> IdReuseEligibility {
        self.eligibility
    }

    /// Open with the configuration the provider gives for `id_type`.
    pub fn open_configured(
        &self,
        layout: &DatabaseLayout,
        id_type: IdType,
    ) -> Result<Arc<dyn IdGenerator>, PortError> {
        let configuration = self.configuration_provider.configuration(id_type);
        self.open(layout, id_type, configuration)
    }

    /// Release buffered ids of every generator, if reuse is currently eligible.
    pub fn maintenance(&self) -> usize {
        if !self.eligibility.is_eligible() {
            return 0;
        }
        self.buffered
            .read()
            .values()
            .map(|generator| generator.maintenance())
            .sum()
    }
}

impl IdGeneratorFactory for BufferingIdGeneratorFactory {
    fn open(
        &self,
        layout: &DatabaseLayout,
        id_type: IdType,
        configuration: IdTypeConfiguration,
    ) -> Result<Arc<dyn IdGenerator>, PortError> {
        let generator = self.delegate.open(layout, id_type, configuration)?;
        if !configuration.allow_aggressive_reuse {
            return Ok(generator);
        }

        let buffering = Arc::clone(
            self.buffered
                .write()
                .entry(id_type)
                .or_insert_with(|| Arc::new(BufferingIdGenerator::new(generator))),
        );
        Ok(buffering)
    }

    fn get(&self, id_type: IdType) -> Option<Arc<dyn IdGenerator>> {
        if let Some(buffering) = self.buffered.read().get(&id_type) {
            return Some(Arc::clone(buffering) as Arc<dyn IdGenerator>);
        }
        self.delegate.get(id_type)
    }
}

// =============================================================================
// Controller
// =============================================================================

/// Job group used for id maintenance.
pub const ID_MAINTENANCE_GROUP: &str = "id-maintenance";

const MAINTENANCE_PERIOD: Duration = Duration::from_secs(1);

/// Drives periodic maintenance of a buffering id generator factory.
pub struct BufferedIdController {
    factory: Arc<BufferingIdGeneratorFactory>,
    scheduler: Arc<dyn JobScheduler>,
    job: Mutex<Option<JobHandle>>,
}

impl BufferedIdController {
    pub fn new(factory: BufferingIdGeneratorFactory, scheduler: Arc<dyn JobScheduler>) -> Self {
        Self {
            factory: Arc::new(factory),
            scheduler,
            job: Mutex::new(None),
        }
    }

    pub fn id_generator_factory(&self) -> &Arc<BufferingIdGeneratorFactory> {
        &self.factory
    }

    /// Schedule maintenance. Starting twice keeps the first job.
    pub fn start(&self) {
        let mut job = self.job.lock();
        if job.is_some() {
            return;
        }
        let factory = Arc::clone(&self.factory);
        *job = Some(self.scheduler.schedule_recurring(
            ID_MAINTENANCE_GROUP,
            MAINTENANCE_PERIOD,
            Arc::new(move || {
                factory.maintenance();
            }),
        ));
    }

    pub fn stop(&self) {
        if let Some(job) = self.job.lock().take() {
            job.cancel();
        }
    }

    pub fn is_running(&self) -> bool {
        self.job.lock().is_some()
    }

    pub fn maintenance(&self) -> usize {
        self.factory.maintenance()
    }
}
