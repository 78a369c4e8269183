//! # File Snapshot Store
//!
//! One JSON file per data directory. Saves write a temporary file and
//! rename it over the snapshot, so a crash leaves either the old or the new
//! snapshot on disk.
//!
//! The directory is held with an exclusive `fs2` lock for as long as the
//! store lives. Two processes sharing a data directory would overwrite each
//! other's snapshots.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use shared_types::AppState;
use tracing::{debug, warn};

use crate::domain::StoreError;
use crate::ports::SnapshotPersistence;

/// Exclusive lock on a data directory, released on drop.
struct DirectoryLock {
    file: File,
    path: PathBuf,
}

impl DirectoryLock {
    const LOCK_FILE: &'static str = "LOCK";

    fn acquire(data_dir: &Path) -> Result<Self, StoreError> {
        let path = data_dir.join(Self::LOCK_FILE);
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)?;

        if file.try_lock_exclusive().is_err() {
            return Err(StoreError::Locked { path });
        }

        let mut locked = file;
        locked.set_len(0)?;
        writeln!(locked, "{}", std::process::id())?;
        locked.sync_all()?;
        Ok(Self { file: locked, path })
    }
}

impl Drop for DirectoryLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
        let _ = fs::remove_file(&self.path);
    }
}

/// Snapshot persisted as `committees.json` in a data directory.
pub struct FileSnapshotStore {
    path: PathBuf,
    _lock: DirectoryLock,
}

impl FileSnapshotStore {
    /// Snapshot file name.
    pub const SNAPSHOT_FILE: &'static str = "committees.json";

    /// Open (and lock) `data_dir`, creating it if needed.
    ///
    /// # Errors
    ///
    /// `StoreError::Locked` if another process holds the directory.
    pub fn open(data_dir: &Path) -> Result<Self, StoreError> {
        fs::create_dir_all(data_dir)?;
        let lock = DirectoryLock::acquire(data_dir)?;
        Ok(Self {
            path: data_dir.join(Self::SNAPSHOT_FILE),
            _lock: lock,
        })
    }

    /// Location of the snapshot file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        self.path.with_extension("json.tmp")
    }
}

impl SnapshotPersistence for FileSnapshotStore {
    fn load(&self) -> Result<Option<AppState>, StoreError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let state = serde_json::from_slice(&bytes)?;
        debug!(path = %self.path.display(), "Snapshot loaded");
        Ok(Some(state))
    }

    fn save(&self, state: &AppState) -> Result<(), StoreError> {
        let temp = self.temp_path();
        let bytes = serde_json::to_vec(state)?;

        let result = write_then_rename(&temp, &self.path, &bytes);
        if result.is_err() {
            warn!(path = %temp.display(), "Snapshot write failed, removing temporary file");
            let _ = fs::remove_file(&temp);
        }
        result
    }
}

fn write_then_rename(temp: &Path, path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    let mut file = File::create(temp)?;
    file.write_all(bytes)?;
    file.sync_all()?;
    fs::rename(temp, path)?;
    Ok(())
}
