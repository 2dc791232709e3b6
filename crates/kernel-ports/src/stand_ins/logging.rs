//! Log stand-ins: a silent log and one that forwards into `tracing`.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::ports::{Log, LogProvider, LogService};

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullLog;

impl Log for NullLog {
    fn debug(&self, _message: &str) {}

    fn info(&self, _message: &str) {}

    fn warn(&self, _message: &str) {}

    fn error(&self, _message: &str) {}
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NullLogProvider;

impl LogProvider for NullLogProvider {
    fn get_log(&self, _context: &str) -> Arc<dyn Log> {
        Arc::new(NullLog)
    }
}

/// Log forwarding to the `tracing` subscriber, tagged with its context.
#[derive(Debug, Clone)]
pub struct TracingLog {
    context: String,
}

impl Log for TracingLog {
    fn debug(&self, message: &str) {
        debug!(context = %self.context, "{message}");
    }

    fn info(&self, message: &str) {
        info!(context = %self.context, "{message}");
    }

    fn warn(&self, message: &str) {
        warn!(context = %self.context, "{message}");
    }

    fn error(&self, message: &str) {
        error!(context = %self.context, "{message}");
    }

    fn is_debug_enabled(&self) -> bool {
        tracing::enabled!(tracing::Level::DEBUG)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogProvider;

impl LogProvider for TracingLogProvider {
    fn get_log(&self, context: &str) -> Arc<dyn Log> {
        Arc::new(TracingLog {
            context: context.to_string(),
        })
    }
}

/// Log service over a fixed pair of providers.
#[derive(Clone)]
pub struct SimpleLogService {
    user: Arc<dyn LogProvider>,
    internal: Arc<dyn LogProvider>,
}

impl SimpleLogService {
    pub fn new(user: Arc<dyn LogProvider>, internal: Arc<dyn LogProvider>) -> Self {
        Self { user, internal }
    }

    /// Both providers silent.
    pub fn null() -> Self {
        Self::new(Arc::new(NullLogProvider), Arc::new(NullLogProvider))
    }

    /// Both providers forwarding to `tracing`.
    pub fn tracing() -> Self {
        Self::new(Arc::new(TracingLogProvider), Arc::new(TracingLogProvider))
    }
}

impl LogService for SimpleLogService {
    fn user_log_provider(&self) -> Arc<dyn LogProvider> {
        Arc::clone(&self.user)
    }

    fn internal_log_provider(&self) -> Arc<dyn LogProvider> {
        Arc::clone(&self.internal)
    }
}
