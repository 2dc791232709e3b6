//! # Kernel Fixture
//!
//! Builds fully-wired graph kernel runtime instances for tests.
//!
//! ## Protocol
//!
//! ```text
//! ScenarioParameters.overrides
//!         │ copy
//!         ▼
//! DependencyContainer ──▶ DefaultResolver (26 capabilities, fixed order)
//!         │
//!         ▼
//! CreationContext (pass-through + fixed + derived fields)
//!         │
//!         ▼
//! RuntimeFactory::construct_runtime ──▶ ManagedInstance owned by LifecycleGuard
//! ```
//!
//! ## Usage
//!
//! ```no_run
//! use kernel_fixture::{InertRuntimeFactory, LifecycleGuard, ScenarioParameters};
//!
//! let mut guard = LifecycleGuard::new(InertRuntimeFactory);
//! let params = ScenarioParameters::ephemeral("/graph");
//!
//! guard
//!     .run_scenario(&params, |db| -> Result<(), kernel_fixture::FixtureError> {
//!         assert!(db.is_available());
//!         Ok(())
//!     })
//!     .unwrap();
//! ```

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod config;
pub mod container;
pub mod context;
pub mod errors;
pub mod guard;
pub mod logging;
pub mod resolver;
pub mod runtime;
pub mod scenario;

// Re-export main types
pub use config::FixtureConfig;
pub use container::DependencyContainer;
pub use context::CreationContext;
pub use errors::{FixtureError, RuntimeError, UnresolvedDependency};
pub use guard::{GuardState, LifecycleGuard, ScenarioScope};
pub use logging::init_test_logging;
pub use resolver::{
    resolve_or_default, DefaultResolver, DefaultingReport, DependencyDescriptor, Resolution,
};
pub use runtime::{
    InertDatabase, InertRuntimeFactory, InstanceId, ManagedInstance, RuntimeFactory,
    RuntimeHandle,
};
pub use scenario::{ScenarioParameters, DEFAULT_INSTANCE_NAME};

/// Fresh stand-in token holders for property keys, labels and relationship
/// types.
pub fn stand_in_token_holders() -> kernel_ports::TokenHolders {
    kernel_ports::stand_ins::stand_in_token_holders()
}
