//! # Fixture Errors
//!
//! Two failure families reach the caller of a build: a capability that could
//! not be resolved or defaulted, and a runtime that failed to construct or to
//! stop. Neither is retried here.

use kernel_ports::PortError;
use thiserror::Error;

/// A capability was requested that the container does not hold.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unresolved dependency: {capability}")]
pub struct UnresolvedDependency {
    /// Type name of the capability key.
    pub capability: &'static str,
}

/// Failure reported by the runtime under test.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuntimeError {
    #[error("Runtime construction failed: {0}")]
    Construction(String),

    #[error("Runtime shutdown failed: {0}")]
    Shutdown(String),
}

/// Errors surfaced by the fixture.
#[derive(Debug, Error)]
pub enum FixtureError {
    #[error(transparent)]
    UnresolvedDependency(#[from] UnresolvedDependency),

    #[error("Default for {capability} could not be constructed: {source}")]
    DefaultConstruction {
        capability: &'static str,
        #[source]
        source: PortError,
    },

    #[error("Construction failed: {0}")]
    Construction(#[source] RuntimeError),

    #[error("Stopping the active instance failed: {0}")]
    Shutdown(#[source] RuntimeError),

    #[error("Invalid fixture configuration: {0}")]
    InvalidConfig(String),
}

impl FixtureError {
    /// True for failures of the runtime's own stop.
    pub fn is_shutdown(&self) -> bool {
        matches!(self, FixtureError::Shutdown(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unresolved_dependency_converts() {
        let error: FixtureError = UnresolvedDependency {
            capability: "Arc<dyn Locks>",
        }
        .into();

        assert!(matches!(error, FixtureError::UnresolvedDependency(_)));
        assert_eq!(error.to_string(), "Unresolved dependency: Arc<dyn Locks>");
    }

    #[test]
    fn test_shutdown_error_is_flagged() {
        let error = FixtureError::Shutdown(RuntimeError::Shutdown("disk".into()));

        assert!(error.is_shutdown());
        assert!(error.to_string().contains("disk"));
    }
}
