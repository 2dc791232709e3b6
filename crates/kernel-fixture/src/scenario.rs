//! Scenario parameters: everything a single build needs from the caller.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use kernel_ports::stand_ins::{EphemeralFileSystem, EphemeralPageCache};
use kernel_ports::{DatabaseLayout, FileSystemAbstraction, PageCache};

use crate::container::DependencyContainer;

/// Instance name used when the caller gives none.
pub const DEFAULT_INSTANCE_NAME: &str = "default";

/// Inputs of one build request.
#[derive(Clone)]
pub struct ScenarioParameters {
    instance_name: String,
    storage_location: PathBuf,
    file_system: Arc<dyn FileSystemAbstraction>,
    page_cache: Arc<dyn PageCache>,
    overrides: DependencyContainer,
}

impl ScenarioParameters {
    pub fn new(
        storage_location: impl Into<PathBuf>,
        file_system: Arc<dyn FileSystemAbstraction>,
        page_cache: Arc<dyn PageCache>,
    ) -> Self {
        Self {
            instance_name: DEFAULT_INSTANCE_NAME.to_string(),
            storage_location: storage_location.into(),
            file_system,
            page_cache,
            overrides: DependencyContainer::new(),
        }
    }

    /// In-memory file system and page cache rooted at `storage_location`.
    pub fn ephemeral(storage_location: impl Into<PathBuf>) -> Self {
        Self::new(
            storage_location,
            Arc::new(EphemeralFileSystem::new()),
            Arc::new(EphemeralPageCache::default()),
        )
    }

    pub fn with_instance_name(mut self, name: impl Into<String>) -> Self {
        self.instance_name = name.into();
        self
    }

    /// Capabilities that take precedence over defaults. The container is
    /// copied on each build, never mutated.
    pub fn with_overrides(mut self, overrides: DependencyContainer) -> Self {
        self.overrides = overrides;
        self
    }

    pub fn instance_name(&self) -> &str {
        &self.instance_name
    }

    pub fn storage_location(&self) -> &Path {
        &self.storage_location
    }

    pub fn file_system(&self) -> &Arc<dyn FileSystemAbstraction> {
        &self.file_system
    }

    pub fn page_cache(&self) -> &Arc<dyn PageCache> {
        &self.page_cache
    }

    pub fn overrides(&self) -> &DependencyContainer {
        &self.overrides
    }

    /// Layout of the instance's database under the storage location.
    pub fn database_layout(&self) -> DatabaseLayout {
        DatabaseLayout::of(self.storage_location.clone(), self.instance_name.clone())
    }
}
