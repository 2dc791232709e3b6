//! Database health: records the first panic and refuses work afterwards.

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::error;

use crate::errors::PortError;
use crate::ports::{Log, PanicEventGenerator};

/// Tracks whether the database has panicked.
pub struct DatabaseHealth {
    database: String,
    cause: RwLock<Option<String>>,
    events: Arc<dyn PanicEventGenerator>,
    log: Arc<dyn Log>,
}

impl DatabaseHealth {
    pub fn new(
        database: impl Into<String>,
        events: Arc<dyn PanicEventGenerator>,
        log: Arc<dyn Log>,
    ) -> Self {
        Self {
            database: database.into(),
            cause: RwLock::new(None),
            events,
            log,
        }
    }

    /// Mark the database as panicked. Only the first cause is kept.
    pub fn panic(&self, cause: &str) {
        {
            let mut current = self.cause.write();
            if current.is_some() {
                return;
            }
            *current = Some(cause.to_string());
        }

        error!(database = %self.database, cause, "Database panic");
        self.log
            .error(&format!("Database '{}' panicked: {cause}", self.database));
        self.events.generate_event(cause);
    }

    pub fn is_healthy(&self) -> bool {
        self.cause.read().is_none()
    }

    pub fn cause(&self) -> Option<String> {
        self.cause.read().clone()
    }

    pub fn assert_healthy(&self) -> Result<(), PortError> {
        match self.cause.read().as_ref() {
            None => Ok(()),
            Some(cause) => Err(PortError::DatabasePanicked {
                database: self.database.clone(),
                cause: cause.clone(),
            }),
        }
    }

    /// Clear a recorded panic, e.g. after recovery.
    pub fn healed(&self) {
        *self.cause.write() = None;
    }
}
