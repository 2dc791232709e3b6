//! In-memory file system, page cache and layout watcher.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::entities::DatabaseLayout;
use crate::errors::PortError;
use crate::ports::{DatabaseLayoutWatcher, FileSystemAbstraction, PageCache, WatcherServiceFactory};

/// File system held entirely in memory.
#[derive(Debug, Default)]
pub struct EphemeralFileSystem {
    files: RwLock<BTreeMap<PathBuf, Vec<u8>>>,
    directories: RwLock<BTreeSet<PathBuf>>,
}

impl EphemeralFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn file_count(&self) -> usize {
        self.files.read().len()
    }

    pub fn directory_exists(&self, path: &Path) -> bool {
        self.directories.read().contains(path)
    }
}

impl FileSystemAbstraction for EphemeralFileSystem {
    fn file_exists(&self, path: &Path) -> bool {
        self.files.read().contains_key(path) || self.directories.read().contains(path)
    }

    fn mkdirs(&self, path: &Path) -> Result<(), PortError> {
        if self.files.read().contains_key(path) {
            return Err(PortError::io(path, "a file with that name exists"));
        }
        let mut directories = self.directories.write();
        for ancestor in path.ancestors() {
            if ancestor.as_os_str().is_empty() {
                continue;
            }
            directories.insert(ancestor.to_path_buf());
        }
        Ok(())
    }

    fn write_all(&self, path: &Path, data: &[u8]) -> Result<(), PortError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !self.directories.read().contains(parent) {
                return Err(PortError::io(path, "parent directory does not exist"));
            }
        }
        self.files.write().insert(path.to_path_buf(), data.to_vec());
        Ok(())
    }

    fn read_all(&self, path: &Path) -> Result<Vec<u8>, PortError> {
        self.files
            .read()
            .get(path)
            .cloned()
            .ok_or_else(|| PortError::io(path, "no such file"))
    }

    fn delete(&self, path: &Path) -> Result<(), PortError> {
        self.files
            .write()
            .remove(path)
            .map(|_| ())
            .ok_or_else(|| PortError::io(path, "no such file"))
    }
}

/// Page cache that holds no pages and counts flushes.
#[derive(Debug)]
pub struct EphemeralPageCache {
    page_size: usize,
    max_cached_pages: usize,
    flushes: AtomicU64,
}

impl EphemeralPageCache {
    pub const DEFAULT_PAGE_SIZE: usize = 8192;

    pub fn new(page_size: usize, max_cached_pages: usize) -> Self {
        Self {
            page_size,
            max_cached_pages,
            flushes: AtomicU64::new(0),
        }
    }

    pub fn flush_count(&self) -> u64 {
        self.flushes.load(Ordering::SeqCst)
    }
}

impl Default for EphemeralPageCache {
    fn default() -> Self {
        Self::new(Self::DEFAULT_PAGE_SIZE, 64)
    }
}

impl PageCache for EphemeralPageCache {
    fn page_size(&self) -> usize {
        self.page_size
    }

    fn max_cached_pages(&self) -> usize {
        self.max_cached_pages
    }

    fn flush_and_force(&self) -> Result<(), PortError> {
        self.flushes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Watcher that only records whether it was started.
#[derive(Debug, Default)]
pub struct NoopLayoutWatcher {
    watching: AtomicBool,
}

impl DatabaseLayoutWatcher for NoopLayoutWatcher {
    fn start_watching(&self) -> Result<(), PortError> {
        self.watching.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn stop_watching(&self) {
        self.watching.store(false, Ordering::SeqCst);
    }

    fn is_watching(&self) -> bool {
        self.watching.load(Ordering::SeqCst)
    }
}

/// Watcher factory producing a fresh [`NoopLayoutWatcher`] per layout.
pub fn noop_watcher_service_factory() -> WatcherServiceFactory {
    Arc::new(|_layout: &DatabaseLayout| {
        Arc::new(NoopLayoutWatcher::default()) as Arc<dyn DatabaseLayoutWatcher>
    })
}
