use super::backend::StorageBackend;
use crate::error::{PaperError, Result};
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Clone)]
struct FileEntry {
    data: Vec<u8>,
    modified: DateTime<Utc>,
}

/// A rename as seen by the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameRecord {
    pub from: PathBuf,
    pub to: PathBuf,
    /// The target already existed when the rename was attempted.
    pub target_occupied: bool,
}

/// In-memory storage backend for testing.
///
/// Every rename attempt is recorded so tests can assert that no renumbering ever targets
/// an occupied key. Modification times come from a logical clock that advances by one
/// second per write, which makes staleness checks deterministic.
pub struct MemBackend {
    files: Mutex<BTreeMap<PathBuf, FileEntry>>,
    dirs: Mutex<BTreeSet<PathBuf>>,
    renames: Mutex<Vec<RenameRecord>>,
    writes: Mutex<HashMap<PathBuf, usize>>,
    clock: AtomicI64,
    simulate_write_error: AtomicBool,
}

impl Default for MemBackend {
    fn default() -> Self {
        Self {
            files: Mutex::new(BTreeMap::new()),
            dirs: Mutex::new(BTreeSet::new()),
            renames: Mutex::new(Vec::new()),
            writes: Mutex::new(HashMap::new()),
            clock: AtomicI64::new(1_700_000_000),
            simulate_write_error: AtomicBool::new(false),
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MemBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn tick(&self) -> DateTime<Utc> {
        let secs = self.clock.fetch_add(1, Ordering::SeqCst);
        DateTime::from_timestamp(secs, 0).unwrap_or_default()
    }

    fn add_dir_chain(dirs: &mut BTreeSet<PathBuf>, dir: &Path) {
        for ancestor in dir.ancestors() {
            if ancestor.as_os_str().is_empty() {
                break;
            }
            dirs.insert(ancestor.to_path_buf());
        }
    }

    /// Enable write error simulation for testing error handling.
    pub fn set_simulate_write_error(&self, simulate: bool) {
        self.simulate_write_error.store(simulate, Ordering::SeqCst);
    }

    /// Test helper to set mtime directly for staleness testing.
    /// Returns true if the entry existed and was updated.
    pub fn set_modified(&self, path: &Path, modified: DateTime<Utc>) -> bool {
        match lock(&self.files).get_mut(path) {
            Some(entry) => {
                entry.modified = modified;
                true
            }
            None => false,
        }
    }

    pub fn renames(&self) -> Vec<RenameRecord> {
        lock(&self.renames).clone()
    }

    /// Renames that targeted a path which already existed. Must stay empty.
    pub fn clobber_attempts(&self) -> Vec<RenameRecord> {
        lock(&self.renames)
            .iter()
            .filter(|r| r.target_occupied)
            .cloned()
            .collect()
    }

    pub fn write_count(&self, path: &Path) -> usize {
        lock(&self.writes).get(path).copied().unwrap_or(0)
    }

    pub fn file_names(&self, dir: &Path) -> Vec<String> {
        self.list_files(dir).unwrap_or_default()
    }
}

impl StorageBackend for MemBackend {
    fn read(&self, path: &Path) -> Result<Option<Vec<u8>>> {
        Ok(lock(&self.files).get(path).map(|e| e.data.clone()))
    }

    fn write(&self, path: &Path, data: &[u8]) -> Result<()> {
        if self.simulate_write_error.load(Ordering::SeqCst) {
            return Err(PaperError::Store("Simulated write error".to_string()));
        }
        if let Some(parent) = path.parent() {
            Self::add_dir_chain(&mut lock(&self.dirs), parent);
        }
        let modified = self.tick();
        lock(&self.files).insert(
            path.to_path_buf(),
            FileEntry {
                data: data.to_vec(),
                modified,
            },
        );
        *lock(&self.writes).entry(path.to_path_buf()).or_insert(0) += 1;
        Ok(())
    }

    fn remove(&self, path: &Path) -> Result<()> {
        lock(&self.files).remove(path);
        Ok(())
    }

    fn rename(&self, from: &Path, to: &Path) -> Result<()> {
        let mut files = lock(&self.files);
        let target_occupied = files.contains_key(to);
        lock(&self.renames).push(RenameRecord {
            from: from.to_path_buf(),
            to: to.to_path_buf(),
            target_occupied,
        });
        if target_occupied {
            return Err(PaperError::KeyCollision(to.to_path_buf()));
        }
        let entry = files.remove(from).ok_or_else(|| {
            PaperError::Store(format!("Rename source missing: {}", from.display()))
        })?;
        files.insert(to.to_path_buf(), entry);
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        lock(&self.files).contains_key(path)
    }

    fn modified(&self, path: &Path) -> Result<Option<DateTime<Utc>>> {
        Ok(lock(&self.files).get(path).map(|e| e.modified))
    }

    fn list_files(&self, dir: &Path) -> Result<Vec<String>> {
        Ok(lock(&self.files)
            .keys()
            .filter(|p| p.parent() == Some(dir))
            .filter_map(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
            .collect())
    }

    fn list_dirs(&self, root: &Path) -> Result<Vec<PathBuf>> {
        Ok(lock(&self.dirs)
            .iter()
            .filter(|d| d.parent() == Some(root))
            .cloned()
            .collect())
    }

    fn create_dir(&self, dir: &Path) -> Result<()> {
        Self::add_dir_chain(&mut lock(&self.dirs), dir);
        Ok(())
    }

    fn remove_dir(&self, dir: &Path) -> Result<()> {
        lock(&self.files).retain(|p, _| !p.starts_with(dir));
        lock(&self.dirs).retain(|d| !d.starts_with(dir));
        Ok(())
    }

    fn dir_exists(&self, dir: &Path) -> bool {
        lock(&self.dirs).contains(dir)
    }
}
