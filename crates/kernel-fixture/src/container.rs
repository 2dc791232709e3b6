//! # Dependency Container
//!
//! Maps a capability key to one shared instance. The key is the Rust type of
//! the registered value, normally `Arc<dyn Trait>` or `Arc<Component>`, so
//! resolving hands back a cheap clone of the same `Arc`.
//!
//! ## Scope
//!
//! A container is created fresh for every build by copying the caller's
//! overrides with [`DependencyContainer::derive_from`]. Registration during
//! defaulting only touches the copy. Copies share the registered instances,
//! not the map.

use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::errors::UnresolvedDependency;

#[derive(Clone)]
struct Entry {
    capability: &'static str,
    instance: Arc<dyn Any + Send + Sync>,
}

/// Capability key to instance mapping, scoped to one build.
#[derive(Clone, Default)]
pub struct DependencyContainer {
    entries: HashMap<TypeId, Entry>,
}

impl DependencyContainer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of `parent`. Later registrations on either side are not shared.
    pub fn derive_from(parent: &DependencyContainer) -> Self {
        parent.clone()
    }

    /// Set the instance for capability `T`, replacing any previous one.
    /// Returns the registered value.
    pub fn register<T>(&mut self, instance: T) -> T
    where
        T: Clone + Send + Sync + 'static,
    {
        let capability = type_name::<T>();
        let previous = self.entries.insert(
            TypeId::of::<T>(),
            Entry {
                capability,
                instance: Arc::new(instance.clone()),
            },
        );
        if previous.is_some() {
            debug!(capability, "Replaced registered dependency");
        }
        instance
    }

    /// Builder form of [`register`](Self::register).
    pub fn with<T>(mut self, instance: T) -> Self
    where
        T: Clone + Send + Sync + 'static,
    {
        self.register(instance);
        self
    }

    /// Instance registered for capability `T`.
    pub fn resolve<T>(&self) -> Result<T, UnresolvedDependency>
    where
        T: Clone + Send + Sync + 'static,
    {
        self.entries
            .get(&TypeId::of::<T>())
            .and_then(|entry| entry.instance.downcast_ref::<T>())
            .cloned()
            .ok_or(UnresolvedDependency {
                capability: type_name::<T>(),
            })
    }

    pub fn contains<T: 'static>(&self) -> bool {
        self.entries.contains_key(&TypeId::of::<T>())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Names of all registered capabilities, sorted.
    pub fn capabilities(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self.entries.values().map(|e| e.capability).collect();
        names.sort_unstable();
        names
    }
}

impl fmt::Debug for DependencyContainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DependencyContainer")
            .field("capabilities", &self.capabilities())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kernel_ports::stand_ins::{FakeClock, SystemClock};
    use kernel_ports::{same_instance, SystemNanoClock};

    #[test]
    fn test_resolve_missing_capability_fails() {
        let container = DependencyContainer::new();

        let result = container.resolve::<Arc<dyn SystemNanoClock>>();

        let Err(error) = result else {
            panic!("expected resolution to fail");
        };
        assert!(error.capability.contains("SystemNanoClock"));
    }

    #[test]
    fn test_resolve_returns_registered_instance() {
        let mut container = DependencyContainer::new();
        let clock: Arc<dyn SystemNanoClock> = Arc::new(FakeClock::at_millis(3));
        container.register(Arc::clone(&clock));

        let resolved = container.resolve::<Arc<dyn SystemNanoClock>>().unwrap();

        assert!(same_instance(&resolved, &clock));
    }

    #[test]
    fn test_register_overwrites() {
        let mut container = DependencyContainer::new();
        container.register::<Arc<dyn SystemNanoClock>>(Arc::new(SystemClock::new()));
        let replacement: Arc<dyn SystemNanoClock> = Arc::new(FakeClock::at_millis(9));

        container.register(Arc::clone(&replacement));

        let resolved = container.resolve::<Arc<dyn SystemNanoClock>>().unwrap();
        assert!(same_instance(&resolved, &replacement));
        assert_eq!(container.len(), 1);
    }

    #[test]
    fn test_derived_container_does_not_touch_parent() {
        let parent = DependencyContainer::new()
            .with::<Arc<dyn SystemNanoClock>>(Arc::new(FakeClock::at_millis(1)));

        let mut child = DependencyContainer::derive_from(&parent);
        child.register(Arc::new(String::from("extra")));

        assert_eq!(parent.len(), 1);
        assert_eq!(child.len(), 2);
        assert!(same_instance(
            &parent.resolve::<Arc<dyn SystemNanoClock>>().unwrap(),
            &child.resolve::<Arc<dyn SystemNanoClock>>().unwrap()
        ));
    }

    #[test]
    fn test_keys_distinguish_trait_object_and_concrete_arc() {
        let container = DependencyContainer::new().with(Arc::new(FakeClock::at_millis(0)));

        assert!(container.contains::<Arc<FakeClock>>());
        assert!(!container.contains::<Arc<dyn SystemNanoClock>>());
    }
}
