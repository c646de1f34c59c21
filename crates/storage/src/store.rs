// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The state directory: lock, state document and per-tool workspaces.

use std::fs::{self, DirBuilder, File, OpenOptions};
use std::io::{self, Write};
use std::os::unix::fs::{DirBuilderExt, OpenOptionsExt};
use std::path::{Path, PathBuf};

use bbl_core::{BblError, State, StateIoKind, CURRENT_SCHEMA_VERSION};
use fs2::FileExt;
use thiserror::Error;
use tracing::{debug, info};

use crate::migration::{MigrationError, MigrationRegistry};

pub const STATE_FILE: &str = "bbl-state.json";
pub const LOCK_FILE: &str = "bbl-lock";
const TMP_SUFFIX: &str = ".tmp";

/// Workspaces bbl creates under the state directory.
pub const STATE_DIRS: [&str; 6] = [
    "vars",
    "terraform",
    "bosh-deployment",
    "jumpbox-deployment",
    "cloud-config",
    "runtime-configs",
];

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("state directory {} is already in use by another bbl process", .0.display())]
    AlreadyInUse(PathBuf),
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("state file {} is corrupt: {source}", path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("state file {}: {source}", path.display())]
    Migration {
        path: PathBuf,
        #[source]
        source: MigrationError,
    },
}

impl From<StoreError> for BblError {
    fn from(err: StoreError) -> Self {
        let kind = match &err {
            StoreError::AlreadyInUse(_) => StateIoKind::Locked,
            StoreError::Io { .. } => StateIoKind::Io,
            StoreError::Corrupt { .. } | StoreError::Migration { .. } => StateIoKind::Corrupt,
        };
        BblError::StateIo { kind, message: err.to_string() }
    }
}

fn io_err(path: &Path) -> impl FnOnce(io::Error) -> StoreError + '_ {
    move |source| StoreError::Io { path: path.to_path_buf(), source }
}

/// Exclusive handle on one state directory.
#[derive(Debug)]
pub struct StateStore {
    dir: PathBuf,
    // Held for the lifetime of the store; the advisory lock drops with it.
    lock: File,
}

impl StateStore {
    /// Lock `dir` (creating it if needed). Fails fast if another process
    /// holds the lock.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(io_err(&dir))?;

        let lock_path = dir.join(LOCK_FILE);
        // No truncation: the file may belong to a running invocation.
        let lock = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)
            .map_err(io_err(&lock_path))?;
        if let Err(e) = lock.try_lock_exclusive() {
            if e.kind() == fs2::lock_contended_error().kind() {
                return Err(StoreError::AlreadyInUse(dir));
            }
            return Err(StoreError::Io { path: lock_path, source: e });
        }

        debug!(dir = %dir.display(), "state directory locked");
        Ok(Self { dir, lock })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn state_path(&self) -> PathBuf {
        self.dir.join(STATE_FILE)
    }

    /// Current state, migrated to this build's schema. A missing file is a
    /// fresh environment.
    pub fn get(&self) -> Result<State, StoreError> {
        let path = self.state_path();
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(State::default()),
            Err(e) => return Err(StoreError::Io { path, source: e }),
        };
        let value: serde_json::Value = serde_json::from_str(&raw)
            .map_err(|source| StoreError::Corrupt { path: path.clone(), source })?;
        migrate_at(value, &path)
    }

    /// Atomically replace the state document.
    pub fn set(&self, state: &State) -> Result<(), StoreError> {
        let path = self.state_path();
        let tmp = self.dir.join(format!("{STATE_FILE}{TMP_SUFFIX}"));

        let mut encoded = serde_json::to_string_pretty(state)
            .map_err(|source| StoreError::Corrupt { path: path.clone(), source })?;
        encoded.push('\n');

        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o600)
            .open(&tmp)
            .map_err(io_err(&tmp))?;
        file.write_all(encoded.as_bytes()).map_err(io_err(&tmp))?;
        file.sync_all().map_err(io_err(&tmp))?;
        drop(file);

        fs::rename(&tmp, &path).map_err(io_err(&path))?;
        File::open(&self.dir).and_then(|d| d.sync_all()).map_err(io_err(&self.dir))?;
        Ok(())
    }

    /// Path of a workspace under the state directory, created `0700` if
    /// missing.
    pub fn get_dir(&self, name: &str) -> Result<PathBuf, StoreError> {
        let path = self.dir.join(name);
        DirBuilder::new().recursive(true).mode(0o700).create(&path).map_err(io_err(&path))?;
        Ok(path)
    }

    /// Remove everything bbl wrote, then the directory itself if that
    /// leaves it empty. Consumes the store and releases the lock.
    pub fn destroy(self) -> Result<(), StoreError> {
        for name in [STATE_FILE.to_string(), format!("{STATE_FILE}{TMP_SUFFIX}")] {
            let path = self.dir.join(name);
            match fs::remove_file(&path) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(StoreError::Io { path, source: e }),
            }
        }
        for name in STATE_DIRS {
            let path = self.dir.join(name);
            match fs::remove_dir_all(&path) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(StoreError::Io { path, source: e }),
            }
        }

        let Self { dir, lock } = self;
        let lock_path = dir.join(LOCK_FILE);
        let _ = FileExt::unlock(&lock);
        drop(lock);
        let _ = fs::remove_file(&lock_path);

        if fs::remove_dir(&dir).is_ok() {
            info!(dir = %dir.display(), "removed state directory");
        } else {
            info!(dir = %dir.display(), "removed state files; directory kept (not empty)");
        }
        Ok(())
    }
}

/// Decode a raw state document, applying every pending migration.
pub fn migrate(raw: serde_json::Value) -> Result<State, StoreError> {
    migrate_at(raw, Path::new(STATE_FILE))
}

fn migrate_at(raw: serde_json::Value, path: &Path) -> Result<State, StoreError> {
    let value = MigrationRegistry::builtin()
        .migrate_to(raw, CURRENT_SCHEMA_VERSION)
        .map_err(|source| StoreError::Migration { path: path.to_path_buf(), source })?;
    serde_json::from_value(value)
        .map_err(|source| StoreError::Corrupt { path: path.to_path_buf(), source })
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
