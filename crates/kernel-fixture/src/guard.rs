//! # Lifecycle Guard
//!
//! Owns at most one built instance and makes sure it is stopped.
//!
//! ```text
//!          build() ok
//!   Idle ─────────────▶ Active
//!    ▲                    │
//!    └──── stop() ────────┘   (also: build() again, teardown, drop)
//! ```
//!
//! ## Failure rules
//!
//! - A failed build leaves the guard `Idle`; nothing partial is kept.
//! - `stop()` releases the instance before stopping it, so the guard is
//!   `Idle` afterwards even if the runtime's stop fails. The failure is
//!   returned.
//! - Building while `Active` stops the current instance first. If that stop
//!   fails, the build is abandoned with the shutdown error.

use std::ops::{Deref, DerefMut};

use tracing::{debug, error, info, instrument, warn};

use crate::config::FixtureConfig;
use crate::container::DependencyContainer;
use crate::context::CreationContext;
use crate::errors::FixtureError;
use crate::resolver::DefaultResolver;
use crate::runtime::{ManagedInstance, RuntimeFactory};
use crate::scenario::ScenarioParameters;

/// Whether a guard currently holds an instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardState {
    Idle,
    Active,
}

/// Builds instances with a runtime factory, one at a time.
pub struct LifecycleGuard<F: RuntimeFactory> {
    factory: F,
    config: FixtureConfig,
    active: Option<ManagedInstance<F::Runtime>>,
}

impl<F: RuntimeFactory> LifecycleGuard<F> {
    pub fn new(factory: F) -> Self {
        Self {
            factory,
            config: FixtureConfig::default(),
            active: None,
        }
    }

    pub fn with_config(factory: F, config: FixtureConfig) -> Result<Self, FixtureError> {
        config.validate()?;
        Ok(Self {
            factory,
            config,
            active: None,
        })
    }

    pub fn state(&self) -> GuardState {
        if self.active.is_some() {
            GuardState::Active
        } else {
            GuardState::Idle
        }
    }

    pub fn config(&self) -> &FixtureConfig {
        &self.config
    }

    pub fn factory(&self) -> &F {
        &self.factory
    }

    pub fn instance(&self) -> Option<&ManagedInstance<F::Runtime>> {
        self.active.as_ref()
    }

    pub fn instance_mut(&mut self) -> Option<&mut ManagedInstance<F::Runtime>> {
        self.active.as_mut()
    }

    /// Build a new instance, stopping the active one first.
    #[instrument(skip_all, fields(instance = %params.instance_name()))]
    pub fn build(
        &mut self,
        params: &ScenarioParameters,
    ) -> Result<&mut ManagedInstance<F::Runtime>, FixtureError> {
        if self.active.is_some() {
            warn!("Instance still active, stopping it before rebuilding");
            self.stop()?;
        }

        let mut container = DependencyContainer::derive_from(params.overrides());
        let report = DefaultResolver::standard(params).resolve_all(&mut container)?;
        debug!(
            supplied = report.supplied.len(),
            defaulted = report.defaulted.len(),
            "Dependencies resolved"
        );

        let context = CreationContext::assemble(params, container, &self.config)?;
        let runtime = self
            .factory
            .construct_runtime(context)
            .map_err(FixtureError::Construction)?;

        let instance = ManagedInstance::new(params.instance_name(), runtime);
        info!(id = %instance.id(), "Instance active");
        Ok(self.active.insert(instance))
    }

    /// Stop the active instance, if any.
    pub fn stop(&mut self) -> Result<(), FixtureError> {
        let Some(mut instance) = self.active.take() else {
            return Ok(());
        };

        let result = instance.stop().map_err(FixtureError::Shutdown);
        match &result {
            Ok(()) => info!(id = %instance.id(), "Instance stopped"),
            Err(e) => warn!(id = %instance.id(), error = %e, "Instance failed to stop"),
        }
        result
    }

    /// End-of-scenario hook. Same as [`stop`](Self::stop).
    pub fn teardown(&mut self) -> Result<(), FixtureError> {
        self.stop()
    }

    /// Borrow the guard for one scenario; teardown runs when the scope ends,
    /// including during a panic.
    pub fn scope(&mut self) -> ScenarioScope<'_, F> {
        ScenarioScope { guard: self }
    }

    /// Build, run `body` against the instance, then tear down.
    ///
    /// An error from `body` wins over a teardown error. A panicking body
    /// still triggers teardown before the panic continues.
    pub fn run_scenario<T, E, B>(&mut self, params: &ScenarioParameters, body: B) -> Result<T, E>
    where
        B: FnOnce(&mut ManagedInstance<F::Runtime>) -> Result<T, E>,
        E: From<FixtureError>,
    {
        let mut scope = self.scope();
        let instance = scope.build(params)?;
        let outcome = body(instance);
        let teardown = scope.finish();

        match (outcome, teardown) {
            (Err(body_error), Err(teardown_error)) => {
                error!(error = %teardown_error, "Teardown failed after scenario failure");
                Err(body_error)
            }
            (Err(body_error), Ok(())) => Err(body_error),
            (Ok(_), Err(teardown_error)) => Err(teardown_error.into()),
            (Ok(value), Ok(())) => Ok(value),
        }
    }
}

impl<F: RuntimeFactory> Drop for LifecycleGuard<F> {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            error!(error = %e, "Teardown on drop failed");
        }
    }
}

/// Guard borrowed for one scenario. Tears down on drop.
pub struct ScenarioScope<'a, F: RuntimeFactory> {
    guard: &'a mut LifecycleGuard<F>,
}

impl<F: RuntimeFactory> ScenarioScope<'_, F> {
    /// Tear down now and report the result.
    pub fn finish(self) -> Result<(), FixtureError> {
        self.guard.teardown()
    }
}

impl<F: RuntimeFactory> Deref for ScenarioScope<'_, F> {
    type Target = LifecycleGuard<F>;

    fn deref(&self) -> &LifecycleGuard<F> {
        self.guard
    }
}

impl<F: RuntimeFactory> DerefMut for ScenarioScope<'_, F> {
    fn deref_mut(&mut self) -> &mut LifecycleGuard<F> {
        self.guard
    }
}

impl<F: RuntimeFactory> Drop for ScenarioScope<'_, F> {
    fn drop(&mut self) {
        if let Err(e) = self.guard.teardown() {
            error!(error = %e, "Scenario teardown failed");
        }
    }
}
