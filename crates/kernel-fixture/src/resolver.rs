//! # Default Resolution
//!
//! Every capability the runtime needs is listed here once, in the order its
//! default is built. A default may resolve capabilities that appear earlier
//! in the list, never later ones:
//!
//! ```text
//!  1 Config                      14 TokenHolders
//!  2 LogService                  15 StatementLocksFactory
//!  3 IdGeneratorFactory (fs)     16 Locks
//!  4 IdTypeConfigurationProvider 17 SchemaWriteGuard
//!  5 DatabaseHealth              18 TransactionEventHandlers
//!  6 SystemNanoClock             19 CommitProcessFactory
//!  7 TransactionMonitor          20 ConstraintSemantics
//!  8 DatabaseAvailabilityGuard   21 Monitors
//!    (needs 6)                   22 GlobalProcedures
//!  9 DiagnosticsManager          23 TransactionCounters
//! 10 IndexProvider               24 DatabaseEventHandlers
//! 11 StorageEngineFactory        25 DatabaseMigratorFactory
//! 12 JobScheduler                26 VersionContextSupplier
//! 13 TokenNameLookup
//! ```
//!
//! A capability already in the container is kept as is; otherwise the
//! default is built and registered, so later lookups see the same instance.

use std::any::type_name;
use std::sync::Arc;

use kernel_ports::config::DEFAULT_SCHEMA_PROVIDER;
use kernel_ports::ids::{CommunityIdTypeConfigurationProvider, DefaultIdGeneratorFactory};
use kernel_ports::stand_ins::{
    available_storage_engines, stand_in_token_holders, AllowAllSchemaWriteGuard,
    CommunityCommitProcessFactory, EmptyIndexProvider, FormattingTokenNameLookup,
    InMemoryGlobalProcedures, ManualJobScheduler, NoopDatabaseEventHandlers,
    NoopDatabaseMigratorFactory, NoopDiagnosticsManager, NoopLocks, NoopPanicEventGenerator,
    NoopTransactionCounters, NoopTransactionEventHandlers, NullLog, SimpleLogService,
    StandInStatementLocksFactory, StandardConstraintSemantics, SystemClock,
    TransactionVersionContextSupplier,
};
use kernel_ports::{
    select_storage_engine, CommitProcessFactory, Config, ConstraintSemantics,
    DatabaseAvailabilityGuard, DatabaseEventHandlers, DatabaseHealth, DatabaseMigratorFactory,
    DatabaseTransactionStats, DiagnosticsManager, GlobalProcedures, IdGeneratorFactory,
    IdTypeConfigurationProvider, IndexProvider, JobScheduler, LogService, Locks, Monitors,
    PortError, SchemaWriteGuard, StatementLocksFactory, StorageEngineFactory, SystemNanoClock,
    TokenHolders, TokenNameLookup, TransactionCounters, TransactionEventHandlers,
    TransactionMonitor, VersionContextSupplier,
};
use tracing::debug;

use crate::container::DependencyContainer;
use crate::errors::FixtureError;
use crate::scenario::ScenarioParameters;

/// Resolve capability `T`, or build it with `default` and register it.
///
/// `default` sees the container as it is at that point, so it can resolve
/// anything registered earlier.
pub fn resolve_or_default<T, F>(
    container: &mut DependencyContainer,
    default: F,
) -> Result<T, FixtureError>
where
    T: Clone + Send + Sync + 'static,
    F: FnOnce(&DependencyContainer) -> Result<T, FixtureError>,
{
    if let Ok(existing) = container.resolve::<T>() {
        return Ok(existing);
    }

    let instance = default(container)?;
    debug!(capability = type_name::<T>(), "Registered default dependency");
    Ok(container.register(instance))
}

/// Wrap a stand-in's failure with the capability it was building.
pub fn default_failed<T: 'static>(source: PortError) -> FixtureError {
    FixtureError::DefaultConstruction {
        capability: type_name::<T>(),
        source,
    }
}

/// How a capability ended up in the container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Supplied,
    Defaulted,
}

type Apply =
    Box<dyn Fn(&mut DependencyContainer) -> Result<Resolution, FixtureError> + Send + Sync>;

/// One capability key paired with its default factory.
pub struct DependencyDescriptor {
    capability: &'static str,
    apply: Apply,
}

impl DependencyDescriptor {
    pub fn new<T, F>(default: F) -> Self
    where
        T: Clone + Send + Sync + 'static,
        F: Fn(&DependencyContainer) -> Result<T, FixtureError> + Send + Sync + 'static,
    {
        Self::finished(default, |_: &T| {})
    }

    /// Like [`new`](Self::new), then run `finish` on the resolved instance,
    /// whether it was supplied or defaulted.
    pub fn finished<T, F, G>(default: F, finish: G) -> Self
    where
        T: Clone + Send + Sync + 'static,
        F: Fn(&DependencyContainer) -> Result<T, FixtureError> + Send + Sync + 'static,
        G: Fn(&T) + Send + Sync + 'static,
    {
        Self {
            capability: type_name::<T>(),
            apply: Box::new(move |container: &mut DependencyContainer| {
                let resolution = if container.contains::<T>() {
                    Resolution::Supplied
                } else {
                    Resolution::Defaulted
                };
                let instance = resolve_or_default(container, &default)?;
                finish(&instance);
                Ok(resolution)
            }),
        }
    }

    pub fn capability(&self) -> &'static str {
        self.capability
    }

    pub fn apply(&self, container: &mut DependencyContainer) -> Result<Resolution, FixtureError> {
        (self.apply)(container)
    }
}

/// Which capabilities were supplied and which were defaulted, in order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DefaultingReport {
    pub supplied: Vec<&'static str>,
    pub defaulted: Vec<&'static str>,
}

/// Ordered list of capabilities with their defaults.
pub struct DefaultResolver {
    descriptors: Vec<DependencyDescriptor>,
}

impl DefaultResolver {
    pub fn empty() -> Self {
        Self {
            descriptors: Vec::new(),
        }
    }

    /// Append a descriptor. It may depend on anything already listed.
    pub fn then(mut self, descriptor: DependencyDescriptor) -> Self {
        self.descriptors.push(descriptor);
        self
    }

    /// Every capability the runtime needs, with stand-in defaults.
    pub fn standard(params: &ScenarioParameters) -> Self {
        let fs = Arc::clone(params.file_system());
        let health_name = params.instance_name().to_string();
        let guard_name = params.instance_name().to_string();

        Self::empty()
            .then(DependencyDescriptor::finished(
                |_| Ok(Arc::new(Config::defaults())),
                |config: &Arc<Config>| {
                    let provider = EmptyIndexProvider.descriptor().name();
                    config.augment(DEFAULT_SCHEMA_PROVIDER, provider);
                },
            ))
            .then(DependencyDescriptor::new(|_| {
                Ok(Arc::new(SimpleLogService::null()) as Arc<dyn LogService>)
            }))
            .then(DependencyDescriptor::new(move |_| {
                Ok(Arc::new(DefaultIdGeneratorFactory::new(Arc::clone(&fs)))
                    as Arc<dyn IdGeneratorFactory>)
            }))
            .then(DependencyDescriptor::new(|_| {
                Ok(Arc::new(CommunityIdTypeConfigurationProvider)
                    as Arc<dyn IdTypeConfigurationProvider>)
            }))
            .then(DependencyDescriptor::new(move |_| {
                Ok(Arc::new(DatabaseHealth::new(
                    health_name.clone(),
                    Arc::new(NoopPanicEventGenerator),
                    Arc::new(NullLog),
                )))
            }))
            .then(DependencyDescriptor::new(|_| {
                Ok(Arc::new(SystemClock::new()) as Arc<dyn SystemNanoClock>)
            }))
            .then(DependencyDescriptor::new(|_| {
                Ok(Arc::new(DatabaseTransactionStats::new()) as Arc<dyn TransactionMonitor>)
            }))
            .then(DependencyDescriptor::new(move |container| {
                let clock = container.resolve::<Arc<dyn SystemNanoClock>>()?;
                Ok(Arc::new(DatabaseAvailabilityGuard::new(
                    guard_name.clone(),
                    clock,
                    Arc::new(NullLog),
                )))
            }))
            .then(DependencyDescriptor::new(|_| {
                Ok(Arc::new(NoopDiagnosticsManager) as Arc<dyn DiagnosticsManager>)
            }))
            .then(DependencyDescriptor::new(|_| {
                Ok(Arc::new(EmptyIndexProvider) as Arc<dyn IndexProvider>)
            }))
            .then(DependencyDescriptor::new(|_| {
                select_storage_engine(available_storage_engines())
                    .map_err(default_failed::<Arc<dyn StorageEngineFactory>>)
            }))
            .then(DependencyDescriptor::new(|_| {
                Ok(Arc::new(ManualJobScheduler::new()) as Arc<dyn JobScheduler>)
            }))
            .then(DependencyDescriptor::new(|_| {
                Ok(Arc::new(FormattingTokenNameLookup) as Arc<dyn TokenNameLookup>)
            }))
            .then(DependencyDescriptor::new(|_| Ok(stand_in_token_holders())))
            .then(DependencyDescriptor::new(|_| {
                Ok(Arc::new(StandInStatementLocksFactory) as Arc<dyn StatementLocksFactory>)
            }))
            .then(DependencyDescriptor::new(|_| {
                Ok(Arc::new(NoopLocks) as Arc<dyn Locks>)
            }))
            .then(DependencyDescriptor::new(|_| {
                Ok(Arc::new(AllowAllSchemaWriteGuard) as Arc<dyn SchemaWriteGuard>)
            }))
            .then(DependencyDescriptor::new(|_| {
                Ok(Arc::new(NoopTransactionEventHandlers) as Arc<dyn TransactionEventHandlers>)
            }))
            .then(DependencyDescriptor::new(|_| {
                Ok(Arc::new(CommunityCommitProcessFactory) as Arc<dyn CommitProcessFactory>)
            }))
            .then(DependencyDescriptor::new(|_| {
                Ok(Arc::new(StandardConstraintSemantics) as Arc<dyn ConstraintSemantics>)
            }))
            .then(DependencyDescriptor::new(|_| Ok(Arc::new(Monitors::new()))))
            .then(DependencyDescriptor::new(|_| {
                Ok(Arc::new(InMemoryGlobalProcedures::new()) as Arc<dyn GlobalProcedures>)
            }))
            .then(DependencyDescriptor::new(|_| {
                Ok(Arc::new(NoopTransactionCounters) as Arc<dyn TransactionCounters>)
            }))
            .then(DependencyDescriptor::new(|_| {
                Ok(Arc::new(NoopDatabaseEventHandlers) as Arc<dyn DatabaseEventHandlers>)
            }))
            .then(DependencyDescriptor::new(|_| {
                Ok(Arc::new(NoopDatabaseMigratorFactory) as Arc<dyn DatabaseMigratorFactory>)
            }))
            .then(DependencyDescriptor::new(|_| {
                Ok(Arc::new(TransactionVersionContextSupplier::new())
                    as Arc<dyn VersionContextSupplier>)
            }))
    }

    /// Capability names in processing order.
    pub fn capabilities(&self) -> Vec<&'static str> {
        self.descriptors.iter().map(|d| d.capability()).collect()
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Apply every descriptor in order. Stops at the first failure.
    pub fn resolve_all(
        &self,
        container: &mut DependencyContainer,
    ) -> Result<DefaultingReport, FixtureError> {
        let mut report = DefaultingReport::default();
        for descriptor in &self.descriptors {
            match descriptor.apply(container)? {
                Resolution::Supplied => report.supplied.push(descriptor.capability()),
                Resolution::Defaulted => report.defaulted.push(descriptor.capability()),
            }
        }
        Ok(report)
    }
}
