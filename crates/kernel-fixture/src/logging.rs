//! Test logging setup.
//!
//! Output goes through the libtest writer so it is captured per test and
//! shown only for failures.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::FixtureConfig;

/// Install a global subscriber for tests.
///
/// `RUST_LOG` wins over the configured level. Returns false when a subscriber
/// was already installed, which is expected when many tests call this.
pub fn init_test_logging(config: &FixtureConfig) -> bool {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let installed = if config.json_logs {
        let json_layer = tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_test_writer();

        tracing_subscriber::registry()
            .with(env_filter)
            .with(json_layer)
            .try_init()
    } else {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_ansi(false)
            .with_test_writer();

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()
    };

    installed.is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_is_harmless() {
        let config = FixtureConfig::default();

        init_test_logging(&config);

        assert!(!init_test_logging(&config));
    }
}
