//! # Creation Context
//!
//! Everything the runtime needs to construct itself, resolved once per build.
//!
//! Fields come in three kinds:
//!
//! - **Pass-through**: copied from the scenario parameters or resolved from
//!   the container.
//! - **Fixed**: the same for every test build (single instance, community
//!   edition, writable, unlimited I/O).
//! - **Derived**: computed after every pass-through field is final, from
//!   those fields and the fixture configuration.

use std::sync::Arc;

use kernel_ports::availability::{CoreApiAvailabilityGuard, DatabaseAvailability};
use kernel_ports::ids::{BufferedIdController, BufferingIdGeneratorFactory};
use kernel_ports::stand_ins::{noop_watcher_service_factory, GraphDatabaseFacade};
use kernel_ports::{
    AccessCapability, CollectionsFactorySupplier, CommitProcessFactory, Config, ConstraintSemantics,
    DatabaseAvailabilityGuard, DatabaseConfig, DatabaseEventHandlers, DatabaseHealth,
    DatabaseInfo, DatabaseLayout, DatabaseMigratorFactory, ExtensionFactory, FileSystemAbstraction,
    GlobalProcedures, IdGeneratorFactory, IdReuseEligibility, IdTypeConfigurationProvider,
    IoLimiter, JobScheduler, LogService, Locks, Monitors, PageCache, QueryEngineProvider,
    SchemaWriteGuard, StatementLocksFactory, StorageEngineFactory, StoreCopyCheckPointMutex,
    SystemNanoClock, TokenHolders, TokenNameLookup, Tracers, TransactionCounters,
    TransactionEventHandlers, TransactionHeaderInformationFactory, TransactionMonitor,
    VersionContextSupplier, WatcherServiceFactory,
};
use tracing::debug;

use crate::config::FixtureConfig;
use crate::container::DependencyContainer;
use crate::errors::FixtureError;
use crate::scenario::ScenarioParameters;

/// Immutable aggregate handed to the runtime factory.
pub struct CreationContext {
    // =========================================================================
    // From the scenario parameters
    // =========================================================================
    database_name: String,
    database_layout: DatabaseLayout,
    fs: Arc<dyn FileSystemAbstraction>,
    page_cache: Arc<dyn PageCache>,

    // =========================================================================
    // From the container
    // =========================================================================
    config: Arc<Config>,
    log_service: Arc<dyn LogService>,
    id_generator_factory: Arc<dyn IdGeneratorFactory>,
    database_health: Arc<DatabaseHealth>,
    clock: Arc<dyn SystemNanoClock>,
    transaction_monitor: Arc<dyn TransactionMonitor>,
    availability_guard: Arc<DatabaseAvailabilityGuard>,
    storage_engine_factory: Arc<dyn StorageEngineFactory>,
    scheduler: Arc<dyn JobScheduler>,
    token_name_lookup: Arc<dyn TokenNameLookup>,
    token_holders: TokenHolders,
    statement_locks_factory: Arc<dyn StatementLocksFactory>,
    locks: Arc<dyn Locks>,
    schema_write_guard: Arc<dyn SchemaWriteGuard>,
    transaction_event_handlers: Arc<dyn TransactionEventHandlers>,
    commit_process_factory: Arc<dyn CommitProcessFactory>,
    constraint_semantics: Arc<dyn ConstraintSemantics>,
    monitors: Arc<Monitors>,
    global_procedures: Arc<dyn GlobalProcedures>,
    database_event_handlers: Arc<dyn DatabaseEventHandlers>,
    database_migrator_factory: Arc<dyn DatabaseMigratorFactory>,
    version_context_supplier: Arc<dyn VersionContextSupplier>,
    dependency_resolver: Arc<DependencyContainer>,

    // =========================================================================
    // Fixed
    // =========================================================================
    transaction_header_information_factory: TransactionHeaderInformationFactory,
    io_limiter: IoLimiter,
    access_capability: AccessCapability,
    store_copy_check_point_mutex: Arc<StoreCopyCheckPointMutex>,
    database_info: DatabaseInfo,
    collections_factory_supplier: CollectionsFactorySupplier,
    extension_factories: Vec<Arc<dyn ExtensionFactory>>,
    watcher_service_factory: WatcherServiceFactory,
    facade: Arc<GraphDatabaseFacade>,
    engine_providers: Vec<Arc<dyn QueryEngineProvider>>,

    // =========================================================================
    // Derived
    // =========================================================================
    database_config: DatabaseConfig,
    tracers: Tracers,
    id_controller: Arc<BufferedIdController>,
    database_availability: DatabaseAvailability,
    core_api_availability_guard: CoreApiAvailabilityGuard,
}

impl CreationContext {
    /// Build the context from a fully defaulted container.
    ///
    /// Fails with [`FixtureError::InvalidConfig`] if `config` is out of range
    /// and with [`FixtureError::UnresolvedDependency`] if the container
    /// lacks a required capability.
    pub fn assemble(
        params: &ScenarioParameters,
        container: DependencyContainer,
        config: &FixtureConfig,
    ) -> Result<Self, FixtureError> {
        config.validate()?;

        let database_name = params.instance_name().to_string();

        let settings: Arc<Config> = container.resolve()?;
        let clock: Arc<dyn SystemNanoClock> = container.resolve()?;
        let availability_guard: Arc<DatabaseAvailabilityGuard> = container.resolve()?;
        let scheduler: Arc<dyn JobScheduler> = container.resolve()?;
        let monitors: Arc<Monitors> = container.resolve()?;
        let id_generator_factory: Arc<dyn IdGeneratorFactory> = container.resolve()?;
        let id_type_configuration_provider: Arc<dyn IdTypeConfigurationProvider> =
            container.resolve()?;
        let transaction_counters: Arc<dyn TransactionCounters> = container.resolve()?;

        let database_config = DatabaseConfig::from_config(&settings, &database_name);
        let tracers = Tracers::new(
            "null",
            Arc::clone(&monitors),
            Arc::clone(&scheduler),
            Arc::clone(&clock),
        );
        let id_controller = Arc::new(BufferedIdController::new(
            BufferingIdGeneratorFactory::new(
                Arc::clone(&id_generator_factory),
                IdReuseEligibility::Always,
                id_type_configuration_provider,
            ),
            Arc::clone(&scheduler),
        ));
        let database_availability = DatabaseAvailability::new(
            Arc::clone(&availability_guard),
            transaction_counters,
            Arc::clone(&clock),
            config.await_active_transactions_timeout,
        );
        let core_api_availability_guard = CoreApiAvailabilityGuard::new(
            Arc::clone(&availability_guard),
            config.availability_check_timeout,
        );

        let context = Self {
            database_layout: params.database_layout(),
            fs: Arc::clone(params.file_system()),
            page_cache: Arc::clone(params.page_cache()),

            config: settings,
            log_service: container.resolve()?,
            id_generator_factory,
            database_health: container.resolve()?,
            clock,
            transaction_monitor: container.resolve()?,
            availability_guard,
            storage_engine_factory: container.resolve()?,
            scheduler,
            token_name_lookup: container.resolve()?,
            token_holders: container.resolve()?,
            statement_locks_factory: container.resolve()?,
            locks: container.resolve()?,
            schema_write_guard: container.resolve()?,
            transaction_event_handlers: container.resolve()?,
            commit_process_factory: container.resolve()?,
            constraint_semantics: container.resolve()?,
            monitors,
            global_procedures: container.resolve()?,
            database_event_handlers: container.resolve()?,
            database_migrator_factory: container.resolve()?,
            version_context_supplier: container.resolve()?,
            dependency_resolver: Arc::new(container),

            transaction_header_information_factory: TransactionHeaderInformationFactory::DEFAULT,
            io_limiter: IoLimiter::Unlimited,
            access_capability: AccessCapability::CanWrite,
            store_copy_check_point_mutex: Arc::new(StoreCopyCheckPointMutex::new()),
            database_info: DatabaseInfo::Community,
            collections_factory_supplier: CollectionsFactorySupplier::OnHeap,
            extension_factories: Vec::new(),
            watcher_service_factory: noop_watcher_service_factory(),
            facade: Arc::new(GraphDatabaseFacade::new()),
            engine_providers: Vec::new(),

            database_config,
            tracers,
            id_controller,
            database_availability,
            core_api_availability_guard,
            database_name,
        };

        debug!(
            database = %context.database_name,
            capabilities = context.dependency_resolver.len(),
            "Creation context assembled"
        );
        Ok(context)
    }

    pub fn database_name(&self) -> &str {
        &self.database_name
    }

    pub fn database_layout(&self) -> &DatabaseLayout {
        &self.database_layout
    }

    pub fn fs(&self) -> &Arc<dyn FileSystemAbstraction> {
        &self.fs
    }

    pub fn page_cache(&self) -> &Arc<dyn PageCache> {
        &self.page_cache
    }

    pub fn config(&self) -> &Arc<Config> {
        &self.config
    }

    pub fn log_service(&self) -> &Arc<dyn LogService> {
        &self.log_service
    }

    pub fn id_generator_factory(&self) -> &Arc<dyn IdGeneratorFactory> {
        &self.id_generator_factory
    }

    pub fn database_health(&self) -> &Arc<DatabaseHealth> {
        &self.database_health
    }

    pub fn clock(&self) -> &Arc<dyn SystemNanoClock> {
        &self.clock
    }

    pub fn transaction_monitor(&self) -> &Arc<dyn TransactionMonitor> {
        &self.transaction_monitor
    }

    pub fn availability_guard(&self) -> &Arc<DatabaseAvailabilityGuard> {
        &self.availability_guard
    }

    pub fn storage_engine_factory(&self) -> &Arc<dyn StorageEngineFactory> {
        &self.storage_engine_factory
    }

    pub fn scheduler(&self) -> &Arc<dyn JobScheduler> {
        &self.scheduler
    }

    pub fn token_name_lookup(&self) -> &Arc<dyn TokenNameLookup> {
        &self.token_name_lookup
    }

    pub fn token_holders(&self) -> &TokenHolders {
        &self.token_holders
    }

    pub fn statement_locks_factory(&self) -> &Arc<dyn StatementLocksFactory> {
        &self.statement_locks_factory
    }

    pub fn locks(&self) -> &Arc<dyn Locks> {
        &self.locks
    }

    pub fn schema_write_guard(&self) -> &Arc<dyn SchemaWriteGuard> {
        &self.schema_write_guard
    }

    pub fn transaction_event_handlers(&self) -> &Arc<dyn TransactionEventHandlers> {
        &self.transaction_event_handlers
    }

    pub fn commit_process_factory(&self) -> &Arc<dyn CommitProcessFactory> {
        &self.commit_process_factory
    }

    pub fn constraint_semantics(&self) -> &Arc<dyn ConstraintSemantics> {
        &self.constraint_semantics
    }

    pub fn monitors(&self) -> &Arc<Monitors> {
        &self.monitors
    }

    pub fn global_procedures(&self) -> &Arc<dyn GlobalProcedures> {
        &self.global_procedures
    }

    pub fn database_event_handlers(&self) -> &Arc<dyn DatabaseEventHandlers> {
        &self.database_event_handlers
    }

    pub fn database_migrator_factory(&self) -> &Arc<dyn DatabaseMigratorFactory> {
        &self.database_migrator_factory
    }

    pub fn version_context_supplier(&self) -> &Arc<dyn VersionContextSupplier> {
        &self.version_context_supplier
    }

    /// The frozen container the context was built from.
    pub fn dependency_resolver(&self) -> &Arc<DependencyContainer> {
        &self.dependency_resolver
    }

    /// Same container as [`dependency_resolver`](Self::dependency_resolver).
    pub fn global_dependencies(&self) -> &Arc<DependencyContainer> {
        &self.dependency_resolver
    }

    pub fn transaction_header_information_factory(&self) -> TransactionHeaderInformationFactory {
        self.transaction_header_information_factory
    }

    pub fn io_limiter(&self) -> IoLimiter {
        self.io_limiter
    }

    pub fn access_capability(&self) -> AccessCapability {
        self.access_capability
    }

    pub fn store_copy_check_point_mutex(&self) -> &Arc<StoreCopyCheckPointMutex> {
        &self.store_copy_check_point_mutex
    }

    pub fn database_info(&self) -> DatabaseInfo {
        self.database_info
    }

    pub fn collections_factory_supplier(&self) -> CollectionsFactorySupplier {
        self.collections_factory_supplier
    }

    pub fn extension_factories(&self) -> &[Arc<dyn ExtensionFactory>] {
        &self.extension_factories
    }

    pub fn watcher_service_factory(&self) -> &WatcherServiceFactory {
        &self.watcher_service_factory
    }

    pub fn facade(&self) -> &Arc<GraphDatabaseFacade> {
        &self.facade
    }

    pub fn engine_providers(&self) -> &[Arc<dyn QueryEngineProvider>] {
        &self.engine_providers
    }

    pub fn database_config(&self) -> &DatabaseConfig {
        &self.database_config
    }

    pub fn tracers(&self) -> &Tracers {
        &self.tracers
    }

    pub fn id_controller(&self) -> &Arc<BufferedIdController> {
        &self.id_controller
    }

    pub fn database_availability(&self) -> &DatabaseAvailability {
        &self.database_availability
    }

    pub fn core_api_availability_guard(&self) -> &CoreApiAvailabilityGuard {
        &self.core_api_availability_guard
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use kernel_ports::config::DEFAULT_SCHEMA_PROVIDER;
    use kernel_ports::same_instance;

    use crate::resolver::DefaultResolver;

    fn defaulted(params: &ScenarioParameters) -> DependencyContainer {
        let mut container = DependencyContainer::derive_from(params.overrides());
        DefaultResolver::standard(params)
            .resolve_all(&mut container)
            .unwrap();
        container
    }

    #[test]
    fn test_assemble_fails_on_empty_container() {
        let params = ScenarioParameters::ephemeral("/graph");

        let result = CreationContext::assemble(
            &params,
            DependencyContainer::new(),
            &FixtureConfig::default(),
        );

        assert!(matches!(result, Err(FixtureError::UnresolvedDependency(_))));
    }

    #[test]
    fn test_assemble_rejects_out_of_range_timeouts() {
        let params = ScenarioParameters::ephemeral("/graph");

        let availability = FixtureConfig::default().with_availability_check_timeout(Duration::MAX);
        let result = CreationContext::assemble(&params, defaulted(&params), &availability);
        assert!(matches!(result, Err(FixtureError::InvalidConfig(_))));

        let drain = FixtureConfig::default().with_await_active_transactions_timeout(Duration::MAX);
        let result = CreationContext::assemble(&params, defaulted(&params), &drain);
        assert!(matches!(result, Err(FixtureError::InvalidConfig(_))));
    }

    #[test]
    fn test_fixed_fields() {
        let params = ScenarioParameters::ephemeral("/graph");

        let context =
            CreationContext::assemble(&params, defaulted(&params), &FixtureConfig::default())
                .unwrap();

        assert_eq!(context.database_name(), "default");
        assert_eq!(context.io_limiter(), IoLimiter::Unlimited);
        assert_eq!(context.access_capability(), AccessCapability::CanWrite);
        assert_eq!(context.database_info(), DatabaseInfo::Community);
        assert_eq!(
            context.collections_factory_supplier(),
            CollectionsFactorySupplier::OnHeap
        );
        assert_eq!(
            context.transaction_header_information_factory(),
            TransactionHeaderInformationFactory::DEFAULT
        );
        assert!(context.extension_factories().is_empty());
        assert!(context.engine_providers().is_empty());
        assert!(!context.tracers().is_enabled());
        assert!(!context.facade().is_initialized());
    }

    #[test]
    fn test_pass_through_fields_share_container_instances() {
        let params = ScenarioParameters::ephemeral("/graph");
        let container = defaulted(&params);
        let locks = container.resolve::<Arc<dyn Locks>>().unwrap();

        let context =
            CreationContext::assemble(&params, container, &FixtureConfig::default()).unwrap();

        assert!(same_instance(context.locks(), &locks));
        assert!(same_instance(context.fs(), params.file_system()));
        assert!(same_instance(
            &context.dependency_resolver().resolve::<Arc<dyn Locks>>().unwrap(),
            &locks
        ));
        assert!(Arc::ptr_eq(
            context.dependency_resolver(),
            context.global_dependencies()
        ));
    }

    #[test]
    fn test_derived_fields_are_deterministic() {
        let params = ScenarioParameters::ephemeral("/graph");
        let container = defaulted(&params);
        let config = FixtureConfig::default();

        let first = CreationContext::assemble(&params, container.clone(), &config).unwrap();
        let second = CreationContext::assemble(&params, container, &config).unwrap();

        assert_eq!(first.database_availability(), second.database_availability());
        assert_eq!(
            first.core_api_availability_guard(),
            second.core_api_availability_guard()
        );
        assert_eq!(first.tracers(), second.tracers());
        assert_eq!(first.database_config(), second.database_config());
    }

    #[test]
    fn test_derived_fields_use_configured_timeouts() {
        let params = ScenarioParameters::ephemeral("/graph");
        let config = FixtureConfig::default()
            .with_availability_check_timeout(Duration::from_millis(250))
            .with_await_active_transactions_timeout(Duration::from_millis(750));

        let context = CreationContext::assemble(&params, defaulted(&params), &config).unwrap();

        assert_eq!(
            context.core_api_availability_guard().timeout(),
            Duration::from_millis(250)
        );
        assert_eq!(
            context
                .database_availability()
                .await_active_transactions_timeout(),
            Duration::from_millis(750)
        );
        assert!(same_instance(
            context.database_availability().guard(),
            context.availability_guard()
        ));
    }

    #[test]
    fn test_database_config_sees_augmented_schema_provider() {
        let params = ScenarioParameters::ephemeral("/graph");

        let context =
            CreationContext::assemble(&params, defaulted(&params), &FixtureConfig::default())
                .unwrap();

        assert_eq!(
            context.database_config().get(DEFAULT_SCHEMA_PROVIDER),
            Some("no-index-provider-1.0")
        );
    }
}
