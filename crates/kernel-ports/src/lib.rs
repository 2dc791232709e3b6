//! # Kernel Ports
//!
//! Capability interfaces the graph kernel runtime consumes, and everything a
//! test harness needs to satisfy them without a real storage engine.
//!
//! ## Layout
//!
//! ```text
//! ports/       one trait per capability (driven ports)
//! entities     plain value types: layout, edition, limiter, id types
//! config       global settings and the per-database view of them
//! health       panic tracking
//! availability availability guard, tracker and core API guard
//! monitoring   monitors, tracers, transaction statistics
//! ids          id generators, buffering and the id controller
//! checkpoint   store-copy / checkpoint mutual exclusion
//! stand_ins/   no-op and in-memory implementations used as defaults
//! ```
//!
//! ## Identity
//!
//! Capabilities are shared as `Arc<dyn Trait>` or `Arc<Component>`. Two
//! handles refer to the same collaborator when [`same_instance`] holds.

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod availability;
pub mod checkpoint;
pub mod config;
pub mod entities;
pub mod errors;
pub mod health;
pub mod ids;
pub mod monitoring;
pub mod ports;
pub mod stand_ins;

use std::sync::Arc;

// Re-export main types
pub use availability::{CoreApiAvailabilityGuard, DatabaseAvailability, DatabaseAvailabilityGuard};
pub use checkpoint::StoreCopyCheckPointMutex;
pub use config::{Config, DatabaseConfig};
pub use entities::{
    AccessCapability, CollectionsFactorySupplier, DatabaseInfo, DatabaseLayout, IdReuseEligibility,
    IdType, IdTypeConfiguration, IoLimiter, TokenKind, TransactionHeaderInformationFactory,
};
pub use errors::PortError;
pub use health::DatabaseHealth;
pub use ids::{BufferedIdController, BufferingIdGeneratorFactory};
pub use monitoring::{DatabaseTransactionStats, Monitors, Tracers};
pub use ports::*;

/// Returns true when both handles point at the same allocation.
///
/// Only the data pointer is compared; vtable pointers of `dyn` handles may
/// differ across codegen units for the same object.
pub fn same_instance<T: ?Sized>(a: &Arc<T>, b: &Arc<T>) -> bool {
    std::ptr::eq(Arc::as_ptr(a).cast::<()>(), Arc::as_ptr(b).cast::<()>())
}
