//! File system, page cache and layout watching.

use std::path::Path;
use std::sync::Arc;

use crate::entities::DatabaseLayout;
use crate::errors::PortError;

/// Abstract interface for file operations.
///
/// Production: the host file system. Testing: `EphemeralFileSystem`.
pub trait FileSystemAbstraction: Send + Sync {
    fn file_exists(&self, path: &Path) -> bool;

    /// Create a directory and all missing parents.
    fn mkdirs(&self, path: &Path) -> Result<(), PortError>;

    /// Replace the contents of `path`. The parent directory must exist.
    fn write_all(&self, path: &Path, data: &[u8]) -> Result<(), PortError>;

    fn read_all(&self, path: &Path) -> Result<Vec<u8>, PortError>;

    fn delete(&self, path: &Path) -> Result<(), PortError>;
}

/// Abstract interface for the page cache shared by all stores.
pub trait PageCache: Send + Sync {
    fn page_size(&self) -> usize;

    fn max_cached_pages(&self) -> usize;

    /// Flush every dirty page and force it to storage.
    fn flush_and_force(&self) -> Result<(), PortError>;
}

/// Watches a database directory for external modification.
pub trait DatabaseLayoutWatcher: Send + Sync {
    fn start_watching(&self) -> Result<(), PortError>;

    fn stop_watching(&self);

    fn is_watching(&self) -> bool;
}

/// Creates a watcher for a database layout.
pub type WatcherServiceFactory =
    Arc<dyn Fn(&DatabaseLayout) -> Arc<dyn DatabaseLayoutWatcher> + Send + Sync>;
