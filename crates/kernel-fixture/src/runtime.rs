//! # Runtime Boundary
//!
//! The runtime under test is external: the fixture only hands it a
//! [`CreationContext`] and later asks it to stop. [`InertDatabase`] is a
//! minimal runtime that drives the context's lifecycle components so the
//! fixture is usable without a real engine.

use std::fmt;
use std::ops::{Deref, DerefMut};

use kernel_ports::availability::StopReport;
use tracing::{debug, info};
use uuid::Uuid;

use crate::context::CreationContext;
use crate::errors::RuntimeError;

/// Handle to a constructed runtime.
pub trait RuntimeHandle {
    fn stop(&mut self) -> Result<(), RuntimeError>;
}

/// Constructs the runtime under test from a creation context.
pub trait RuntimeFactory {
    type Runtime: RuntimeHandle;

    fn construct_runtime(&self, context: CreationContext) -> Result<Self::Runtime, RuntimeError>;
}

impl<F, R> RuntimeFactory for F
where
    F: Fn(CreationContext) -> Result<R, RuntimeError>,
    R: RuntimeHandle,
{
    type Runtime = R;

    fn construct_runtime(&self, context: CreationContext) -> Result<R, RuntimeError> {
        self(context)
    }
}

/// Correlates log lines of one built instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InstanceId(Uuid);

impl InstanceId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for InstanceId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A runtime owned by a lifecycle guard.
///
/// Stopping is idempotent: only the first call reaches the runtime.
pub struct ManagedInstance<R> {
    id: InstanceId,
    name: String,
    runtime: R,
    stopped: bool,
}

impl<R: RuntimeHandle> ManagedInstance<R> {
    pub fn new(name: impl Into<String>, runtime: R) -> Self {
        Self {
            id: InstanceId::new(),
            name: name.into(),
            runtime,
            stopped: false,
        }
    }

    pub fn id(&self) -> InstanceId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn runtime(&self) -> &R {
        &self.runtime
    }

    pub fn runtime_mut(&mut self) -> &mut R {
        &mut self.runtime
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    pub fn stop(&mut self) -> Result<(), RuntimeError> {
        if self.stopped {
            return Ok(());
        }
        self.stopped = true;
        debug!(id = %self.id, name = %self.name, "Stopping runtime");
        self.runtime.stop()
    }
}

impl<R> Deref for ManagedInstance<R> {
    type Target = R;

    fn deref(&self) -> &R {
        &self.runtime
    }
}

impl<R> DerefMut for ManagedInstance<R> {
    fn deref_mut(&mut self) -> &mut R {
        &mut self.runtime
    }
}

// =============================================================================
// Inert runtime
// =============================================================================

/// Runtime that starts and stops the context's lifecycle components and
/// nothing else.
pub struct InertDatabase {
    context: CreationContext,
    running: bool,
    last_stop: Option<StopReport>,
}

impl InertDatabase {
    /// Bring the context's components up: availability, id maintenance,
    /// facade and start handlers.
    pub fn start(context: CreationContext) -> Result<Self, RuntimeError> {
        let availability = context.database_availability();
        availability.init();

        context
            .database_health()
            .assert_healthy()
            .map_err(|e| RuntimeError::Construction(e.to_string()))?;

        context.id_controller().start();
        context.facade().init(context.database_name());
        availability.start();
        context
            .database_event_handlers()
            .on_start(context.database_name());

        info!(database = context.database_name(), "Inert database started");
        Ok(Self {
            context,
            running: true,
            last_stop: None,
        })
    }

    pub fn context(&self) -> &CreationContext {
        &self.context
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Report of the most recent stop.
    pub fn last_stop(&self) -> Option<StopReport> {
        self.last_stop
    }

    /// Check the database the way the public API would before serving.
    pub fn is_available(&self) -> bool {
        self.context.core_api_availability_guard().is_available()
    }
}

impl RuntimeHandle for InertDatabase {
    fn stop(&mut self) -> Result<(), RuntimeError> {
        if !self.running {
            return Ok(());
        }
        self.running = false;

        let report = self.context.database_availability().stop();
        self.context.id_controller().stop();
        self.context
            .database_event_handlers()
            .on_shutdown(self.context.database_name());
        self.context.database_availability().shutdown();
        self.last_stop = Some(report);

        self.context
            .database_health()
            .assert_healthy()
            .map_err(|e| RuntimeError::Shutdown(e.to_string()))
    }
}

/// Factory for [`InertDatabase`].
#[derive(Debug, Clone, Copy, Default)]
pub struct InertRuntimeFactory;

impl RuntimeFactory for InertRuntimeFactory {
    type Runtime = InertDatabase;

    fn construct_runtime(&self, context: CreationContext) -> Result<InertDatabase, RuntimeError> {
        InertDatabase::start(context)
    }
}
