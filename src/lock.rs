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

//! Process-exclusive access to a collection directory.
//!
//! The guard is a `collection.lock` file created with `O_EXCL` next to
//! the store, holding the owner's pid. At most one holder exists at a
//! time across processes; acquisition polls up to a bounded timeout and
//! then fails with `LockHeld` rather than hanging.

use std::fs::OpenOptions;
use std::fs::remove_file;
use std::io::ErrorKind;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::process;
use std::thread::sleep;
use std::time::Duration;
use std::time::Instant;

use mnemo_core::Timestamp;
use serde::Deserialize;
use serde::Serialize;

use crate::error::EngineError;
use crate::error::Result;

pub const LOCK_FILE_NAME: &str = "collection.lock";

const POLL_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Serialize, Deserialize)]
struct LockInfo {
    pid: u32,
    acquired_at: Timestamp,
}

/// An exclusive lock on a collection directory. Released on drop, so
/// every exit path gives the lock up.
pub struct CollectionLock {
    path: PathBuf,
    released: bool,
}

impl CollectionLock {
    /// Acquire the lock, waiting up to `timeout` for the current holder
    /// to release it.
    ///
    /// If the lock file names a process that is no longer alive, the lock
    /// is stale. A stale lock is reclaimed only when the caller opted in
    /// via `reclaim_stale`; otherwise it is reported like any other
    /// holder, with a warning telling the user what to do.
    pub fn acquire(directory: &Path, timeout: Duration, reclaim_stale: bool) -> Result<Self> {
        let path = directory.join(LOCK_FILE_NAME);
        let deadline = Instant::now() + timeout;
        loop {
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(mut file) => {
                    let info = LockInfo {
                        pid: process::id(),
                        acquired_at: Timestamp::now(),
                    };
                    file.write_all(serde_json::to_string(&info)?.as_bytes())?;
                    log::debug!("acquired lock at {}", path.display());
                    return Ok(CollectionLock {
                        path,
                        released: false,
                    });
                }
                Err(err) if err.kind() == ErrorKind::AlreadyExists => {
                    let holder = read_holder(&path);
                    if let Some(pid) = holder {
                        if !process_alive(pid) {
                            if reclaim_stale {
                                log::warn!(
                                    "reclaiming stale lock at {} (pid {pid} is gone)",
                                    path.display()
                                );
                                let _ = remove_file(&path);
                                continue;
                            }
                            log::warn!(
                                "lock at {} is held by pid {pid}, which is no longer alive; \
                                 re-run with --reclaim-stale-lock to take it over",
                                path.display()
                            );
                        }
                    }
                    if Instant::now() >= deadline {
                        return Err(EngineError::LockHeld { path, holder });
                    }
                    sleep(POLL_INTERVAL);
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    /// Explicit release. Equivalent to dropping, but surfaces I/O errors.
    pub fn release(mut self) -> Result<()> {
        self.released = true;
        remove_file(&self.path)?;
        Ok(())
    }
}

impl Drop for CollectionLock {
    fn drop(&mut self) {
        if !self.released {
            let _ = remove_file(&self.path);
        }
    }
}

fn read_holder(path: &Path) -> Option<u32> {
    let contents = std::fs::read_to_string(path).ok()?;
    let info: LockInfo = serde_json::from_str(&contents).ok()?;
    Some(info.pid)
}

#[cfg(target_os = "linux")]
fn process_alive(pid: u32) -> bool {
    Path::new(&format!("/proc/{pid}")).exists()
}

/// Without a portable liveness probe, assume the holder is alive; a
/// stale lock then needs manual removal.
#[cfg(not(target_os = "linux"))]
fn process_alive(_pid: u32) -> bool {
    true
}
