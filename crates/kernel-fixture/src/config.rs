//! Fixture configuration from environment variables.

use std::env;
use std::time::Duration;

use crate::errors::FixtureError;

const MAX_TIMEOUT: Duration = Duration::from_secs(3600);

/// Knobs for the fixture itself, separate from the runtime's settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixtureConfig {
    /// How long the core API waits for the database to become available.
    /// Zero answers from the current state.
    pub availability_check_timeout: Duration,

    /// How long stopping waits for active transactions. Zero does not wait.
    pub await_active_transactions_timeout: Duration,

    /// Log level filter used when `RUST_LOG` is unset.
    pub log_level: String,

    /// Emit JSON log lines instead of plain text.
    pub json_logs: bool,
}

impl Default for FixtureConfig {
    fn default() -> Self {
        Self {
            availability_check_timeout: Duration::ZERO,
            await_active_transactions_timeout: Duration::ZERO,
            log_level: "warn".to_string(),
            json_logs: false,
        }
    }
}

impl FixtureConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `KERNEL_FIXTURE_AVAILABILITY_TIMEOUT_MS`: core API availability wait (default: 0)
    /// - `KERNEL_FIXTURE_AWAIT_TX_TIMEOUT_MS`: active transaction drain wait (default: 0)
    /// - `KERNEL_FIXTURE_LOG_LEVEL`: log level (default: warn)
    /// - `KERNEL_FIXTURE_JSON_LOGS`: JSON log output (default: false)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            availability_check_timeout: millis_var("KERNEL_FIXTURE_AVAILABILITY_TIMEOUT_MS")
                .unwrap_or(defaults.availability_check_timeout),

            await_active_transactions_timeout: millis_var("KERNEL_FIXTURE_AWAIT_TX_TIMEOUT_MS")
                .unwrap_or(defaults.await_active_transactions_timeout),

            log_level: env::var("KERNEL_FIXTURE_LOG_LEVEL").unwrap_or(defaults.log_level),

            json_logs: env::var("KERNEL_FIXTURE_JSON_LOGS")
                .map(|v| v.to_lowercase() == "true" || v == "1")
                .unwrap_or(defaults.json_logs),
        }
    }

    pub fn with_availability_check_timeout(mut self, timeout: Duration) -> Self {
        self.availability_check_timeout = timeout;
        self
    }

    pub fn with_await_active_transactions_timeout(mut self, timeout: Duration) -> Self {
        self.await_active_transactions_timeout = timeout;
        self
    }

    pub fn validate(&self) -> Result<(), FixtureError> {
        if self.log_level.trim().is_empty() {
            return Err(FixtureError::InvalidConfig(
                "log_level must not be empty".to_string(),
            ));
        }
        if self.availability_check_timeout > MAX_TIMEOUT {
            return Err(FixtureError::InvalidConfig(format!(
                "availability_check_timeout {:?} exceeds {:?}",
                self.availability_check_timeout, MAX_TIMEOUT
            )));
        }
        if self.await_active_transactions_timeout > MAX_TIMEOUT {
            return Err(FixtureError::InvalidConfig(format!(
                "await_active_transactions_timeout {:?} exceeds {:?}",
                self.await_active_transactions_timeout, MAX_TIMEOUT
            )));
        }
        Ok(())
    }
}

fn millis_var(name: &str) -> Option<Duration> {
    env::var(name)
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_millis)
}
