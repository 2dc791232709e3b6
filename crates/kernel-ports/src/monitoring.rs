//! # Monitoring
//!
//! - [`Monitors`]: listener registry keyed by tag.
//! - [`Tracers`]: tracer selection; the tracer named `"null"` disables tracing.
//! - [`DatabaseTransactionStats`]: atomic transaction counters, usable both as
//!   the transaction monitor and as the counters read by availability.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::ports::{JobScheduler, SystemNanoClock, TransactionCounters, TransactionMonitor};
use crate::same_instance;

/// Callback registered with [`Monitors`].
pub type Listener = Arc<dyn Fn(&str) + Send + Sync>;

/// Registry of event listeners.
#[derive(Default)]
pub struct Monitors {
    listeners: RwLock<HashMap<String, Vec<Listener>>>,
}

impl Monitors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_listener(&self, tag: &str, listener: Listener) {
        self.listeners
            .write()
            .entry(tag.to_string())
            .or_default()
            .push(listener);
    }

    /// Deliver `event` to every listener of `tag`. Returns the number notified.
    pub fn notify(&self, tag: &str, event: &str) -> usize {
        let listeners = match self.listeners.read().get(tag) {
            Some(listeners) => listeners.clone(),
            None => return 0,
        };
        for listener in &listeners {
            listener(event);
        }
        listeners.len()
    }

    pub fn listener_count(&self, tag: &str) -> usize {
        self.listeners.read().get(tag).map_or(0, Vec::len)
    }
}

impl fmt::Debug for Monitors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tags: Vec<String> = self.listeners.read().keys().cloned().collect();
        f.debug_struct("Monitors").field("tags", &tags).finish()
    }
}

/// Tag under which tracer events are published.
pub const TRACER_TAG: &str = "tracer";

const DISABLED_TRACER: &str = "null";

/// Page cache and transaction tracers for one database.
#[derive(Clone)]
pub struct Tracers {
    name: String,
    monitors: Arc<Monitors>,
    scheduler: Arc<dyn JobScheduler>,
    clock: Arc<dyn SystemNanoClock>,
}

impl Tracers {
    pub fn new(
        name: &str,
        monitors: Arc<Monitors>,
        scheduler: Arc<dyn JobScheduler>,
        clock: Arc<dyn SystemNanoClock>,
    ) -> Self {
        Self {
            name: name.to_string(),
            monitors,
            scheduler,
            clock,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_enabled(&self) -> bool {
        !self.name.eq_ignore_ascii_case(DISABLED_TRACER)
    }

    pub fn scheduler(&self) -> &Arc<dyn JobScheduler> {
        &self.scheduler
    }

    /// Publish a timestamped trace event. A disabled tracer drops it.
    pub fn trace(&self, event: &str) -> bool {
        if !self.is_enabled() {
            return false;
        }
        let line = format!("{} {event}", self.clock.millis());
        self.monitors.notify(TRACER_TAG, &line);
        true
    }
}

impl PartialEq for Tracers {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && same_instance(&self.monitors, &other.monitors)
            && same_instance(&self.scheduler, &other.scheduler)
            && same_instance(&self.clock, &other.clock)
    }
}

impl fmt::Debug for Tracers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tracers")
            .field("name", &self.name)
            .field("enabled", &self.is_enabled())
            .finish_non_exhaustive()
    }
}

/// Transaction statistics maintained with atomics.
#[derive(Debug, Default)]
pub struct DatabaseTransactionStats {
    active: AtomicU64,
    started: AtomicU64,
    committed: AtomicU64,
    rolled_back: AtomicU64,
    terminated: AtomicU64,
    write_transactions: AtomicU64,
}

impl DatabaseTransactionStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn number_of_terminated_transactions(&self) -> u64 {
        self.terminated.load(Ordering::Relaxed)
    }

    pub fn number_of_write_transactions(&self) -> u64 {
        self.write_transactions.load(Ordering::Relaxed)
    }
}

impl TransactionMonitor for DatabaseTransactionStats {
    fn transaction_started(&self) {
        self.started.fetch_add(1, Ordering::Relaxed);
        self.active.fetch_add(1, Ordering::SeqCst);
    }

    /// Write transactions are counted on upgrade, so `write` is not recounted here.
    fn transaction_finished(&self, committed: bool, _write: bool) {
        // Never underflow on an unmatched finish.
        let _ = self
            .active
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        if committed {
            self.committed.fetch_add(1, Ordering::Relaxed);
        } else {
            self.rolled_back.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn transaction_terminated(&self) {
        self.terminated.fetch_add(1, Ordering::Relaxed);
    }

    fn upgrade_to_write_transaction(&self) {
        self.write_transactions.fetch_add(1, Ordering::Relaxed);
    }
}

impl TransactionCounters for DatabaseTransactionStats {
    fn number_of_active_transactions(&self) -> u64 {
        self.active.load(Ordering::SeqCst)
    }

    fn number_of_started_transactions(&self) -> u64 {
        self.started.load(Ordering::Relaxed)
    }

    fn number_of_committed_transactions(&self) -> u64 {
        self.committed.load(Ordering::Relaxed)
    }

    fn number_of_rolled_back_transactions(&self) -> u64 {
        self.rolled_back.load(Ordering::Relaxed)
    }
}
