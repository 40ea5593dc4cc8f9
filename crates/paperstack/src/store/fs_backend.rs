use super::backend::StorageBackend;
use crate::error::{PaperError, Result};
use chrono::{DateTime, Utc};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Filesystem backend. Paths are used as given; the store builds them under its workdir.
#[derive(Debug, Default, Clone)]
pub struct FsBackend;

impl FsBackend {
    pub fn new() -> Self {
        Self
    }

    fn ensure_parent(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).map_err(PaperError::Io)?;
            }
        }
        Ok(())
    }
}

impl StorageBackend for FsBackend {
    fn read(&self, path: &Path) -> Result<Option<Vec<u8>>> {
        match fs::read(path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(PaperError::Io(e)),
        }
    }

    fn write(&self, path: &Path, data: &[u8]) -> Result<()> {
        self.ensure_parent(path)?;

        // Atomic Write
        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        let tmp_path = dir.join(format!(".artifact-{}.tmp", Uuid::new_v4()));
        fs::write(&tmp_path, data).map_err(PaperError::Io)?;
        fs::rename(&tmp_path, path).map_err(PaperError::Io)?;

        Ok(())
    }

    fn remove(&self, path: &Path) -> Result<()> {
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(PaperError::Io(e)),
        }
    }

    fn rename(&self, from: &Path, to: &Path) -> Result<()> {
        // std::fs::rename silently replaces the target on unix
        if to.exists() {
            return Err(PaperError::KeyCollision(to.to_path_buf()));
        }
        self.ensure_parent(to)?;
        fs::rename(from, to).map_err(PaperError::Io)
    }

    fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn modified(&self, path: &Path) -> Result<Option<DateTime<Utc>>> {
        match fs::metadata(path) {
            Ok(meta) => {
                let modified = meta.modified().map_err(PaperError::Io)?;
                Ok(Some(modified.into()))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(PaperError::Io(e)),
        }
    }

    fn list_files(&self, dir: &Path) -> Result<Vec<String>> {
        if !dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut names = Vec::new();
        for entry in fs::read_dir(dir).map_err(PaperError::Io)? {
            let entry = entry.map_err(PaperError::Io)?;
            let path = entry.path();
            if path.is_file() {
                if let Some(name) = path.file_name().and_then(|s| s.to_str()) {
                    names.push(name.to_string());
                }
            }
        }
        Ok(names)
    }

    fn list_dirs(&self, root: &Path) -> Result<Vec<PathBuf>> {
        if !root.is_dir() {
            return Ok(Vec::new());
        }

        let mut dirs = Vec::new();
        for entry in fs::read_dir(root).map_err(PaperError::Io)? {
            let path = entry.map_err(PaperError::Io)?.path();
            if path.is_dir() {
                dirs.push(path);
            }
        }
        Ok(dirs)
    }

    fn create_dir(&self, dir: &Path) -> Result<()> {
        fs::create_dir_all(dir).map_err(PaperError::Io)
    }

    fn remove_dir(&self, dir: &Path) -> Result<()> {
        match fs::remove_dir_all(dir) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(PaperError::Io(e)),
        }
    }

    fn dir_exists(&self, dir: &Path) -> bool {
        dir.is_dir()
    }
}
