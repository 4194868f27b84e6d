// Copyright 2026 The Mnemo Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! An opened collection: directory, exclusive lock, and store handle.

use std::env;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use crate::db::Database;
use crate::error::EngineError;
use crate::error::Result;
use crate::lock::CollectionLock;

pub const STORE_FILE_NAME: &str = "collection.sqlite";
pub const MEDIA_DIR_NAME: &str = "media";

/// Environment variable overriding the default collection directory.
pub const DIR_ENV_VAR: &str = "MNEMO_DIR";

const LOCK_TIMEOUT: Duration = Duration::from_secs(5);

/// A live, exclusively-held collection. The lock is taken before the
/// store is opened and held until the collection is dropped.
pub struct Collection {
    directory: PathBuf,
    pub db: Database,
    // Held for its Drop impl.
    _lock: CollectionLock,
}

/// The collection directory to use: an explicit `--dir` beats the
/// `MNEMO_DIR` environment variable, which beats the working directory.
pub fn resolve_directory(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(dir) = explicit {
        return Ok(dir.to_path_buf());
    }
    if let Ok(dir) = env::var(DIR_ENV_VAR) {
        return Ok(PathBuf::from(dir));
    }
    Ok(env::current_dir()?)
}

impl Collection {
    /// Lock and open the collection in `directory`. The directory must
    /// already exist; a brand-new store is initialized inside it on
    /// first open.
    pub fn open(directory: &Path, reclaim_stale_lock: bool) -> Result<Self> {
        if !directory.is_dir() {
            return Err(EngineError::DirectoryMissing(directory.to_path_buf()));
        }
        let lock = CollectionLock::acquire(directory, LOCK_TIMEOUT, reclaim_stale_lock)?;
        let db = Database::open(&directory.join(STORE_FILE_NAME))?;
        log::debug!("opened collection at {}", directory.display());
        Ok(Collection {
            directory: directory.to_path_buf(),
            db,
            _lock: lock,
        })
    }

    pub fn media_dir(&self) -> PathBuf {
        self.directory.join(MEDIA_DIR_NAME)
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn test_open_missing_directory_fails() {
        let dir = tempdir().unwrap();
        let gone = dir.path().join("nope");
        let result = Collection::open(&gone, false);
        assert!(matches!(result, Err(EngineError::DirectoryMissing(_))));
    }

    #[test]
    fn test_open_takes_the_lock() {
        let dir = tempdir().unwrap();
        let first = Collection::open(dir.path(), false).unwrap();
        let second = Collection::open(dir.path(), false);
        assert!(matches!(second, Err(EngineError::LockHeld { .. })));
        drop(first);
        assert!(Collection::open(dir.path(), false).is_ok());
    }

    #[test]
    fn test_store_survives_reopen() {
        let dir = tempdir().unwrap();
        let created = {
            let collection = Collection::open(dir.path(), false).unwrap();
            collection.db.meta().unwrap().created_at
        };
        let collection = Collection::open(dir.path(), false).unwrap();
        assert_eq!(collection.db.meta().unwrap().created_at, created);
    }

    #[test]
    fn test_explicit_directory_wins() {
        let dir = tempdir().unwrap();
        let resolved = resolve_directory(Some(dir.path())).unwrap();
        assert_eq!(resolved, dir.path());
    }
}
