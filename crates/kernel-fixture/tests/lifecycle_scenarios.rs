//! # Lifecycle Scenario Tests
//!
//! Exercise the full build / stop / teardown protocol through the public API
//! with a factory that records every construct and stop in order.
//!
//! ## Test Strategy
//!
//! - A journal records `construct:<n>` and `stop:<n>` events, so ordering and
//!   exactly-once stops are asserted directly.
//! - Failure injection flips the factory into failing construction or
//!   failing stops.
//! - Storage locations come from `tempfile`; files live in the ephemeral
//!   file system.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use kernel_fixture::{
    init_test_logging, CreationContext, DependencyContainer, FixtureConfig, FixtureError,
    GuardState, InertRuntimeFactory, LifecycleGuard, RuntimeError, RuntimeFactory, RuntimeHandle,
    ScenarioParameters,
};
use kernel_ports::stand_ins::{
    EphemeralFileSystem, EphemeralPageCache, FakeClock, ManualJobScheduler, NoopLocks,
};
use kernel_ports::{
    same_instance, DatabaseTransactionStats, IdType, JobScheduler, Locks, SystemNanoClock,
    TransactionCounters, TransactionMonitor,
};
use parking_lot::Mutex;

// =============================================================================
// Recording factory
// =============================================================================

#[derive(Default)]
struct Journal {
    events: Mutex<Vec<String>>,
}

impl Journal {
    fn record(&self, event: String) {
        self.events.lock().push(event);
    }

    fn events(&self) -> Vec<String> {
        self.events.lock().clone()
    }

    fn count(&self, prefix: &str) -> usize {
        self.events
            .lock()
            .iter()
            .filter(|e| e.starts_with(prefix))
            .count()
    }
}

struct RecordingRuntime {
    label: usize,
    journal: Arc<Journal>,
    fail_stop: bool,
}

impl RuntimeHandle for RecordingRuntime {
    fn stop(&mut self) -> Result<(), RuntimeError> {
        self.journal.record(format!("stop:{}", self.label));
        if self.fail_stop {
            return Err(RuntimeError::Shutdown(format!("runtime {} refused", self.label)));
        }
        Ok(())
    }
}

#[derive(Default)]
struct RecordingFactory {
    journal: Arc<Journal>,
    builds: AtomicUsize,
    fail_construct: AtomicBool,
    fail_stop: AtomicBool,
}

impl RecordingFactory {
    fn journal(&self) -> Arc<Journal> {
        Arc::clone(&self.journal)
    }
}

impl RuntimeFactory for RecordingFactory {
    type Runtime = RecordingRuntime;

    fn construct_runtime(&self, _context: CreationContext) -> Result<RecordingRuntime, RuntimeError> {
        if self.fail_construct.load(Ordering::SeqCst) {
            self.journal.record("construct:failed".to_string());
            return Err(RuntimeError::Construction("engine exploded".to_string()));
        }
        let label = self.builds.fetch_add(1, Ordering::SeqCst);
        self.journal.record(format!("construct:{label}"));
        Ok(RecordingRuntime {
            label,
            journal: Arc::clone(&self.journal),
            fail_stop: self.fail_stop.load(Ordering::SeqCst),
        })
    }
}

/// Runtime that just keeps the context for inspection.
struct Captured(CreationContext);

impl RuntimeHandle for Captured {
    fn stop(&mut self) -> Result<(), RuntimeError> {
        Ok(())
    }
}

fn capture(context: CreationContext) -> Result<Captured, RuntimeError> {
    Ok(Captured(context))
}

fn scenario() -> anyhow::Result<(tempfile::TempDir, ScenarioParameters)> {
    init_test_logging(&FixtureConfig::from_env());
    let dir = tempfile::tempdir()?;
    let params = ScenarioParameters::new(
        dir.path(),
        Arc::new(EphemeralFileSystem::new()),
        Arc::new(EphemeralPageCache::default()),
    );
    Ok((dir, params))
}

// =============================================================================
// Build and stop
// =============================================================================

/// A build with no overrides yields a running, available instance that stops cleanly.
#[test]
fn test_default_build_succeeds_and_stop_is_safe() -> anyhow::Result<()> {
    // Arrange
    let (_dir, params) = scenario()?;
    let mut guard = LifecycleGuard::new(InertRuntimeFactory);

    // Act
    let instance = guard.build(&params)?;

    // Assert
    assert_eq!(instance.name(), "default");
    assert!(instance.is_running());
    assert!(instance.is_available());
    instance.stop()?;
    assert!(!instance.is_running());
    assert!(!instance.is_available());
    assert!(instance.runtime().last_stop().is_some_and(|r| r.drained));
    guard.stop()?;
    assert_eq!(guard.state(), GuardState::Idle);
    Ok(())
}

/// Building while active stops the current instance once, before the next is constructed.
#[test]
fn test_second_build_stops_first_exactly_once_before_constructing() -> anyhow::Result<()> {
    let (_dir, params) = scenario()?;
    let factory = RecordingFactory::default();
    let journal = factory.journal();
    let mut guard = LifecycleGuard::new(factory);

    guard.build(&params)?;
    guard.build(&params)?;

    assert_eq!(journal.events(), vec!["construct:0", "stop:0", "construct:1"]);
    assert_eq!(guard.state(), GuardState::Active);

    guard.teardown()?;
    assert_eq!(journal.count("stop:0"), 1);
    assert_eq!(journal.count("stop:1"), 1);
    Ok(())
}

#[test]
fn test_each_build_gets_a_new_instance_id() -> anyhow::Result<()> {
    let (_dir, params) = scenario()?;
    let mut guard = LifecycleGuard::new(RecordingFactory::default());

    let first = guard.build(&params)?.id();
    let second = guard.build(&params)?.id();

    assert_ne!(first, second);
    Ok(())
}

// =============================================================================
// Overrides and defaults
// =============================================================================

/// An overridden capability is the identical instance in the creation context.
#[test]
fn test_override_reaches_creation_context() -> anyhow::Result<()> {
    let (_dir, params) = scenario()?;
    let clock: Arc<dyn SystemNanoClock> = Arc::new(FakeClock::at_millis(1_234));
    let overrides = DependencyContainer::new().with(Arc::clone(&clock));
    let params = params.with_overrides(overrides);
    let mut guard = LifecycleGuard::new(capture);

    let instance = guard.build(&params)?;

    let context = &instance.runtime().0;
    assert!(same_instance(context.clock(), &clock));
    context.availability_guard().require("recovery");
    assert_eq!(context.availability_guard().unavailable_since_millis(), Some(1_234));
    assert_eq!(params.overrides().len(), 1);
    Ok(())
}

#[test]
fn test_service_overrides_feed_derived_fields() -> anyhow::Result<()> {
    // Arrange
    let (_dir, params) = scenario()?;
    let manual = Arc::new(ManualJobScheduler::new());
    let scheduler: Arc<dyn JobScheduler> = Arc::clone(&manual) as Arc<dyn JobScheduler>;
    let stats = Arc::new(DatabaseTransactionStats::new());
    stats.transaction_started();
    stats.transaction_started();
    let counters: Arc<dyn TransactionCounters> = Arc::clone(&stats) as Arc<dyn TransactionCounters>;
    let locks: Arc<dyn Locks> = Arc::new(NoopLocks);
    let overrides = DependencyContainer::new()
        .with(Arc::clone(&scheduler))
        .with(Arc::clone(&counters))
        .with(Arc::clone(&locks));
    let params = params.with_overrides(overrides);
    let mut guard = LifecycleGuard::new(capture);

    // Act
    let instance = guard.build(&params)?;

    // Assert
    let context = &instance.runtime().0;
    assert!(same_instance(context.scheduler(), &scheduler));
    assert!(same_instance(context.tracers().scheduler(), &scheduler));
    assert!(same_instance(context.locks(), &locks));
    assert!(same_instance(
        context.database_availability().counters(),
        &counters
    ));

    let scheduled = manual.scheduled_groups().len();
    context.id_controller().start();
    assert_eq!(manual.scheduled_groups().len(), scheduled + 1);

    let report = context.database_availability().stop();
    assert!(!report.drained);
    assert_eq!(report.remaining_active, 2);
    Ok(())
}

#[test]
fn test_overrides_are_shared_across_builds_but_defaults_are_not() -> anyhow::Result<()> {
    let (_dir, params) = scenario()?;
    let clock: Arc<dyn SystemNanoClock> = Arc::new(FakeClock::at_millis(0));
    let params = params.with_overrides(DependencyContainer::new().with(Arc::clone(&clock)));
    let mut guard = LifecycleGuard::new(capture);

    let first = guard.build(&params)?;
    let first_clock = Arc::clone(first.runtime().0.clock());
    let first_locks: Arc<dyn Locks> = Arc::clone(first.runtime().0.locks());
    let second = guard.build(&params)?;

    assert!(same_instance(second.runtime().0.clock(), &first_clock));
    assert!(!same_instance(second.runtime().0.locks(), &first_locks));
    Ok(())
}

#[test]
fn test_instance_name_flows_into_layout_and_guard() -> anyhow::Result<()> {
    let (dir, params) = scenario()?;
    let params = params.with_instance_name("users");
    let mut guard = LifecycleGuard::new(capture);

    let instance = guard.build(&params)?;

    let context = &instance.runtime().0;
    assert_eq!(context.database_name(), "users");
    assert_eq!(context.availability_guard().database_name(), "users");
    assert_eq!(
        context.database_layout().database_directory(),
        dir.path().join("users")
    );
    assert_eq!(context.database_config().database_name(), "users");
    Ok(())
}

#[test]
fn test_id_generators_write_through_scenario_file_system() -> anyhow::Result<()> {
    let (_dir, params) = scenario()?;
    let fs = Arc::clone(params.file_system());
    let mut guard = LifecycleGuard::new(capture);

    let instance = guard.build(&params)?;
    let context = &instance.runtime().0;
    let generator = context
        .id_controller()
        .id_generator_factory()
        .open_configured(context.database_layout(), IdType::Node)?;

    assert_eq!(generator.next_id(), 0);
    assert!(fs.file_exists(&context.database_layout().id_file(IdType::Node)));
    Ok(())
}

// =============================================================================
// Failures
// =============================================================================

#[test]
fn test_construction_failure_leaves_guard_idle() -> anyhow::Result<()> {
    let (_dir, params) = scenario()?;
    let factory = RecordingFactory::default();
    factory.fail_construct.store(true, Ordering::SeqCst);
    let mut guard = LifecycleGuard::new(factory);

    let result = guard.build(&params);

    assert!(matches!(
        result,
        Err(FixtureError::Construction(RuntimeError::Construction(_)))
    ));
    assert_eq!(guard.state(), GuardState::Idle);
    Ok(())
}

/// A failed stop ahead of a rebuild surfaces and nothing new is constructed.
#[test]
fn test_forced_shutdown_failure_aborts_rebuild() -> anyhow::Result<()> {
    let (_dir, params) = scenario()?;
    let factory = RecordingFactory::default();
    factory.fail_stop.store(true, Ordering::SeqCst);
    let journal = factory.journal();
    let mut guard = LifecycleGuard::new(factory);
    guard.build(&params)?;

    let result = guard.build(&params);

    let Err(error) = result else {
        panic!("rebuild must fail when the previous instance cannot stop");
    };
    assert!(error.is_shutdown());
    assert_eq!(guard.state(), GuardState::Idle);
    assert_eq!(journal.events(), vec!["construct:0", "stop:0"]);
    Ok(())
}

#[test]
fn test_failed_stop_still_leaves_guard_idle() -> anyhow::Result<()> {
    let (_dir, params) = scenario()?;
    let factory = RecordingFactory::default();
    factory.fail_stop.store(true, Ordering::SeqCst);
    let mut guard = LifecycleGuard::new(factory);
    guard.build(&params)?;

    let result = guard.stop();

    assert!(matches!(result, Err(FixtureError::Shutdown(_))));
    assert_eq!(guard.state(), GuardState::Idle);
    assert!(guard.stop().is_ok());
    Ok(())
}

// =============================================================================
// Teardown
// =============================================================================

#[test]
fn test_teardown_after_manual_stop() -> anyhow::Result<()> {
    let (_dir, params) = scenario()?;
    let factory = RecordingFactory::default();
    let journal = factory.journal();
    let mut guard = LifecycleGuard::new(factory);

    guard.build(&params)?.stop()?;
    guard.teardown()?;

    assert_eq!(guard.state(), GuardState::Idle);
    assert_eq!(journal.count("stop:"), 1);
    Ok(())
}

#[test]
fn test_run_scenario_tears_down_after_success() -> anyhow::Result<()> {
    let (_dir, params) = scenario()?;
    let factory = RecordingFactory::default();
    let journal = factory.journal();
    let mut guard = LifecycleGuard::new(factory);

    let label = guard.run_scenario(&params, |instance| -> anyhow::Result<usize> {
        Ok(instance.runtime().label)
    })?;

    assert_eq!(label, 0);
    assert_eq!(guard.state(), GuardState::Idle);
    assert_eq!(journal.events(), vec!["construct:0", "stop:0"]);
    Ok(())
}

#[test]
fn test_run_scenario_body_error_wins_over_teardown_error() -> anyhow::Result<()> {
    let (_dir, params) = scenario()?;
    let factory = RecordingFactory::default();
    factory.fail_stop.store(true, Ordering::SeqCst);
    let mut guard = LifecycleGuard::new(factory);

    let result = guard.run_scenario(&params, |_| -> anyhow::Result<()> {
        anyhow::bail!("assertion in scenario body failed")
    });

    let Err(error) = result else {
        panic!("scenario must fail");
    };
    assert_eq!(error.to_string(), "assertion in scenario body failed");
    assert_eq!(guard.state(), GuardState::Idle);
    Ok(())
}

#[test]
fn test_run_scenario_reports_teardown_error_after_success() -> anyhow::Result<()> {
    let (_dir, params) = scenario()?;
    let factory = RecordingFactory::default();
    factory.fail_stop.store(true, Ordering::SeqCst);
    let mut guard = LifecycleGuard::new(factory);

    let result = guard.run_scenario(&params, |_| -> Result<(), FixtureError> { Ok(()) });

    assert!(matches!(result, Err(FixtureError::Shutdown(_))));
    Ok(())
}

/// Teardown runs while a panicking scenario body unwinds.
#[test]
fn test_panicking_body_still_tears_down() -> anyhow::Result<()> {
    let (_dir, params) = scenario()?;
    let factory = RecordingFactory::default();
    let journal = factory.journal();
    let mut guard = LifecycleGuard::new(factory);

    let outcome = catch_unwind(AssertUnwindSafe(|| {
        guard.run_scenario(&params, |_| -> Result<(), FixtureError> {
            panic!("scenario body panicked")
        })
    }));

    assert!(outcome.is_err());
    assert_eq!(guard.state(), GuardState::Idle);
    assert_eq!(journal.events(), vec!["construct:0", "stop:0"]);
    Ok(())
}

#[test]
fn test_scope_tears_down_when_dropped() -> anyhow::Result<()> {
    let (_dir, params) = scenario()?;
    let factory = RecordingFactory::default();
    let journal = factory.journal();
    let mut guard = LifecycleGuard::new(factory);

    {
        let mut scope = guard.scope();
        scope.build(&params)?;
    }

    assert_eq!(guard.state(), GuardState::Idle);
    assert_eq!(journal.count("stop:"), 1);
    Ok(())
}

#[test]
fn test_dropping_guard_stops_active_instance() -> anyhow::Result<()> {
    let (_dir, params) = scenario()?;
    let factory = RecordingFactory::default();
    let journal = factory.journal();
    let mut guard = LifecycleGuard::new(factory);
    guard.build(&params)?;

    drop(guard);

    assert_eq!(journal.events(), vec!["construct:0", "stop:0"]);
    Ok(())
}
