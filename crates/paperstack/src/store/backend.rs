use crate::error::Result;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};

/// Abstract interface for raw artifact I/O.
/// This trait handles the "how" of storage (filesystem vs memory),
/// while ArtifactStore handles the "what" (naming, caching, thumbnails).
///
/// Implementations are shared with orientation workers, hence `Send + Sync`.
pub trait StorageBackend: Send + Sync {
    // --- Content Operations ---

    /// Read raw bytes.
    /// Returns Ok(None) if the file does not exist.
    /// Returns Err only on actual I/O errors (permissions, disk failure).
    fn read(&self, path: &Path) -> Result<Option<Vec<u8>>>;

    /// Write bytes, replacing any previous content.
    /// MUST be atomic (e.g. write to tmp then rename) to avoid partial writes.
    fn write(&self, path: &Path, data: &[u8]) -> Result<()>;

    /// Delete a file. Missing files are not an error.
    fn remove(&self, path: &Path) -> Result<()>;

    /// Rename `from` to `to`.
    /// MUST refuse to replace an existing `to` with [`crate::error::PaperError::KeyCollision`].
    fn rename(&self, from: &Path, to: &Path) -> Result<()>;

    fn exists(&self, path: &Path) -> bool;

    /// Modification time, or None when the file does not exist.
    fn modified(&self, path: &Path) -> Result<Option<DateTime<Utc>>>;

    // --- Directories ---

    /// File names (not paths) directly inside `dir`. Empty if `dir` does not exist.
    fn list_files(&self, dir: &Path) -> Result<Vec<String>>;

    /// Sub-directories directly inside `root`. Empty if `root` does not exist.
    fn list_dirs(&self, root: &Path) -> Result<Vec<PathBuf>>;

    fn create_dir(&self, dir: &Path) -> Result<()>;

    /// Remove `dir` with everything inside it.
    fn remove_dir(&self, dir: &Path) -> Result<()>;

    fn dir_exists(&self, dir: &Path) -> bool;
}
