//! Runtime logging capabilities.
//!
//! The kernel logs through these interfaces rather than directly through
//! `tracing` so that tests can silence or capture runtime output per build.

use std::sync::Arc;

/// A named log sink.
pub trait Log: Send + Sync {
    fn debug(&self, message: &str);

    fn info(&self, message: &str);

    fn warn(&self, message: &str);

    fn error(&self, message: &str);

    fn is_debug_enabled(&self) -> bool {
        false
    }
}

/// Hands out logs by context name.
pub trait LogProvider: Send + Sync {
    fn get_log(&self, context: &str) -> Arc<dyn Log>;
}

/// User-facing and internal log providers.
pub trait LogService: Send + Sync {
    fn user_log_provider(&self) -> Arc<dyn LogProvider>;

    fn internal_log_provider(&self) -> Arc<dyn LogProvider>;

    fn internal_log(&self, context: &str) -> Arc<dyn Log> {
        self.internal_log_provider().get_log(context)
    }
}
