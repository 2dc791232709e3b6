//! # Availability
//!
//! Three cooperating pieces:
//!
//! - [`DatabaseAvailabilityGuard`]: a set of outstanding requirements. The
//!   database is available when no requirement is outstanding and the guard
//!   has not been shut down.
//! - [`DatabaseAvailability`]: lifecycle component that requires availability
//!   on init, fulfils it on start, and on stop requires it again and waits for
//!   active transactions to drain.
//! - [`CoreApiAvailabilityGuard`]: the check the public API performs before
//!   serving a request.
//!
//! ## Timeouts
//!
//! A zero timeout never waits: checks answer from the current state.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use tracing::{debug, info, warn};

use crate::errors::PortError;
use crate::ports::{Log, SystemNanoClock, TransactionCounters};
use crate::same_instance;

/// Requirement registered by [`DatabaseAvailability`].
pub const DATABASE_AVAILABLE: &str = "Database available";

const DRAIN_POLL_INTERVAL: Duration = Duration::from_millis(5);

#[derive(Debug, Default)]
struct GuardState {
    requirements: Vec<String>,
    shutdown: bool,
    unavailable_since_millis: Option<u64>,
}

/// Tracks what must happen before a database may serve requests.
pub struct DatabaseAvailabilityGuard {
    database: String,
    clock: Arc<dyn SystemNanoClock>,
    log: Arc<dyn Log>,
    state: Mutex<GuardState>,
    changed: Condvar,
}

impl DatabaseAvailabilityGuard {
    pub fn new(
        database: impl Into<String>,
        clock: Arc<dyn SystemNanoClock>,
        log: Arc<dyn Log>,
    ) -> Self {
        Self {
            database: database.into(),
            clock,
            log,
            state: Mutex::new(GuardState::default()),
            changed: Condvar::new(),
        }
    }

    pub fn database_name(&self) -> &str {
        &self.database
    }

    /// Add an outstanding requirement. Requiring the same thing twice needs
    /// two fulfilments.
    pub fn require(&self, requirement: &str) {
        {
            let mut state = self.state.lock();
            if state.requirements.is_empty() {
                state.unavailable_since_millis = Some(self.clock.millis());
            }
            state.requirements.push(requirement.to_string());
        }
        self.log.debug(&format!(
            "Requirement '{requirement}' makes database '{}' unavailable",
            self.database
        ));
    }

    /// Remove one occurrence of `requirement`. Unknown requirements are ignored.
    pub fn fulfill(&self, requirement: &str) {
        let ready = {
            let mut state = self.state.lock();
            let Some(position) = state.requirements.iter().position(|r| r == requirement) else {
                return;
            };
            state.requirements.remove(position);

            let ready = state.requirements.is_empty() && !state.shutdown;
            if ready {
                state.unavailable_since_millis = None;
                self.changed.notify_all();
            }
            ready
        };

        if ready {
            self.log
                .info(&format!("Database '{}' is ready", self.database));
        }
    }

    pub fn is_available(&self) -> bool {
        let state = self.state.lock();
        state.requirements.is_empty() && !state.shutdown
    }

    pub fn is_shutdown(&self) -> bool {
        self.state.lock().shutdown
    }

    /// Wait up to `timeout` for the database to become available.
    ///
    /// A timeout too large to express as an instant waits without a deadline.
    pub fn await_available(&self, timeout: Duration) -> bool {
        let deadline = Instant::now().checked_add(timeout);
        let mut state = self.state.lock();

        loop {
            if state.shutdown {
                return false;
            }
            if state.requirements.is_empty() {
                return true;
            }
            match deadline {
                Some(deadline) => {
                    if self.changed.wait_until(&mut state, deadline).timed_out() {
                        return state.requirements.is_empty() && !state.shutdown;
                    }
                }
                None => self.changed.wait(&mut state),
            }
        }
    }

    /// Permanently mark the database unavailable and wake all waiters.
    pub fn shutdown(&self) {
        {
            let mut state = self.state.lock();
            if state.shutdown {
                return;
            }
            state.shutdown = true;
            state.unavailable_since_millis.get_or_insert(self.clock.millis());
            self.changed.notify_all();
        }
        self.log
            .info(&format!("Database '{}' is shut down", self.database));
    }

    /// Wall-clock millis at which the database last became unavailable.
    pub fn unavailable_since_millis(&self) -> Option<u64> {
        self.state.lock().unavailable_since_millis
    }

    /// Human readable reason the database is unavailable.
    pub fn describe(&self) -> String {
        let state = self.state.lock();
        if state.shutdown {
            "Database is shut down".to_string()
        } else if state.requirements.is_empty() {
            "Database is available".to_string()
        } else {
            format!("Waiting for: {}", state.requirements.join(", "))
        }
    }

    pub fn assert_available(&self, timeout: Duration) -> Result<(), PortError> {
        if self.await_available(timeout) {
            Ok(())
        } else {
            Err(PortError::Unavailable {
                database: self.database.clone(),
                reason: self.describe(),
            })
        }
    }
}

impl fmt::Debug for DatabaseAvailabilityGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseAvailabilityGuard")
            .field("database", &self.database)
            .field("state", &*self.state.lock())
            .finish()
    }
}

/// Outcome of [`DatabaseAvailability::stop`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StopReport {
    /// All active transactions finished before the timeout.
    pub drained: bool,
    pub remaining_active: u64,
    pub stopped_at_millis: u64,
}

/// Lifecycle component bridging the runtime's lifecycle to the guard.
#[derive(Clone)]
pub struct DatabaseAvailability {
    guard: Arc<DatabaseAvailabilityGuard>,
    counters: Arc<dyn TransactionCounters>,
    clock: Arc<dyn SystemNanoClock>,
    await_active_transactions_timeout: Duration,
}

impl DatabaseAvailability {
    pub fn new(
        guard: Arc<DatabaseAvailabilityGuard>,
        counters: Arc<dyn TransactionCounters>,
        clock: Arc<dyn SystemNanoClock>,
        await_active_transactions_timeout: Duration,
    ) -> Self {
        Self {
            guard,
            counters,
            clock,
            await_active_transactions_timeout,
        }
    }

    pub fn guard(&self) -> &Arc<DatabaseAvailabilityGuard> {
        &self.guard
    }

    pub fn counters(&self) -> &Arc<dyn TransactionCounters> {
        &self.counters
    }

    pub fn await_active_transactions_timeout(&self) -> Duration {
        self.await_active_transactions_timeout
    }

    pub fn init(&self) {
        self.guard.require(DATABASE_AVAILABLE);
    }

    pub fn start(&self) {
        self.guard.fulfill(DATABASE_AVAILABLE);
        info!(database = self.guard.database_name(), "Database available");
    }

    /// Block new work, then wait for active transactions to finish.
    pub fn stop(&self) -> StopReport {
        self.guard.require(DATABASE_AVAILABLE);

        // No deadline when the timeout overflows an instant.
        let deadline = Instant::now().checked_add(self.await_active_transactions_timeout);
        let mut active = self.counters.number_of_active_transactions();
        while active > 0 && deadline.map_or(true, |d| Instant::now() < d) {
            let remaining = deadline.map_or(DRAIN_POLL_INTERVAL, |d| {
                d.saturating_duration_since(Instant::now())
            });
            std::thread::sleep(DRAIN_POLL_INTERVAL.min(remaining));
            active = self.counters.number_of_active_transactions();
        }

        if active > 0 {
            warn!(
                database = self.guard.database_name(),
                active, "Stopping with transactions still active"
            );
        } else {
            debug!(database = self.guard.database_name(), "All transactions drained");
        }

        StopReport {
            drained: active == 0,
            remaining_active: active,
            stopped_at_millis: self.clock.millis(),
        }
    }

    pub fn shutdown(&self) {
        self.guard.shutdown();
    }
}

impl PartialEq for DatabaseAvailability {
    fn eq(&self, other: &Self) -> bool {
        same_instance(&self.guard, &other.guard)
            && same_instance(&self.counters, &other.counters)
            && same_instance(&self.clock, &other.clock)
            && self.await_active_transactions_timeout == other.await_active_transactions_timeout
    }
}

impl fmt::Debug for DatabaseAvailability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseAvailability")
            .field("database", &self.guard.database_name())
            .field(
                "await_active_transactions_timeout",
                &self.await_active_transactions_timeout,
            )
            .finish_non_exhaustive()
    }
}

/// Availability check performed by the public API.
#[derive(Clone)]
pub struct CoreApiAvailabilityGuard {
    guard: Arc<DatabaseAvailabilityGuard>,
    timeout: Duration,
}

impl CoreApiAvailabilityGuard {
    pub fn new(guard: Arc<DatabaseAvailabilityGuard>, timeout: Duration) -> Self {
        Self { guard, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn is_available(&self) -> bool {
        self.guard.await_available(self.timeout)
    }

    pub fn assert_database_available(&self) -> Result<(), PortError> {
        self.guard.assert_available(self.timeout)
    }
}

impl PartialEq for CoreApiAvailabilityGuard {
    fn eq(&self, other: &Self) -> bool {
        same_instance(&self.guard, &other.guard) && self.timeout == other.timeout
    }
}

impl fmt::Debug for CoreApiAvailabilityGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CoreApiAvailabilityGuard")
            .field("database", &self.guard.database_name())
            .field("timeout", &self.timeout)
            .finish()
    }
}
