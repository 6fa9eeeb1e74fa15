//! The output workspace: one directory per case plus `cases.json`.
//!
//! A run wipes the workspace before writing, so runs are serialized through an
//! exclusive lock on `<workspace>.lock`, a sibling of the workspace directory.

use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use tracing::info;

use crate::error::ConvertError;

#[derive(Debug, Clone)]
pub struct Workspace {
    root: PathBuf,
}

/// Held for the duration of a run; dropping it releases the workspace.
#[derive(Debug)]
pub struct RunLock {
    file: File,
    path: PathBuf,
}

impl RunLock {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for RunLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

impl Workspace {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    pub fn lock_path(&self) -> PathBuf {
        let mut name = self
            .root
            .file_name()
            .map(OsString::from)
            .unwrap_or_else(|| OsString::from("workspace"));
        name.push(".lock");
        self.root.with_file_name(name)
    }

    /// Take the run lock without waiting.
    ///
    /// # Errors
    ///
    /// [`ConvertError::RunInProgress`] when another run holds it.
    pub fn lock(&self) -> Result<RunLock, ConvertError> {
        let path = self.lock_path();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)?;

        match FileExt::try_lock_exclusive(&file) {
            Ok(()) => Ok(RunLock { file, path }),
            Err(e) if e.kind() == fs2::lock_contended_error().kind() => {
                Err(ConvertError::RunInProgress(path))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Delete whatever a previous run left and start from an empty directory.
    ///
    /// Requires the run lock so a concurrent run cannot be wiped mid-write.
    pub fn reset(&self, lock: &RunLock) -> Result<(), ConvertError> {
        if self.root.exists() {
            info!(
                workspace = %self.root.display(),
                lock = %lock.path().display(),
                "clearing previous output"
            );
            fs::remove_dir_all(&self.root)?;
        }
        fs::create_dir_all(&self.root)?;
        Ok(())
    }

    pub fn case_dir(&self, id: &str) -> PathBuf {
        self.root.join(id)
    }

    pub fn create_case_dir(&self, id: &str) -> Result<PathBuf, ConvertError> {
        let dir = self.case_dir(id);
        fs::create_dir_all(&dir)?;
        Ok(dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn lock_file_sits_next_to_workspace() {
        let ws = Workspace::new("/tmp/out/temp_data");
        assert_eq!(ws.lock_path(), PathBuf::from("/tmp/out/temp_data.lock"));
    }

    #[test]
    fn second_lock_is_refused_until_first_is_dropped() {
        let tmp = TempDir::new().unwrap();
        let ws = Workspace::new(tmp.path().join("ws"));

        let first = ws.lock().unwrap();
        assert!(matches!(ws.lock(), Err(ConvertError::RunInProgress(_))));
        drop(first);
        assert!(ws.lock().is_ok());
    }

    #[test]
    fn reset_discards_previous_artifacts() {
        let tmp = TempDir::new().unwrap();
        let ws = Workspace::new(tmp.path().join("ws"));
        let stale = ws.create_case_dir("old").unwrap().join("ct.bin");
        fs::write(&stale, b"stale").unwrap();

        let lock = ws.lock().unwrap();
        ws.reset(&lock).unwrap();

        assert!(ws.path().is_dir());
        assert!(!stale.exists());
        assert_eq!(fs::read_dir(ws.path()).unwrap().count(), 0);
    }
}
