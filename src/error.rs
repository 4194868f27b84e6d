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

use std::path::PathBuf;

use mnemo_core::SchedulerError;
use thiserror::Error;

/// The engine's error taxonomy. Lock and storage failures abort the
/// current operation; network failures are retried internally before
/// surfacing; scheduler errors are contract violations and fatal to the
/// operation only. An empty due queue is not an error anywhere in this
/// crate.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(
        "collection at {path} is in use by another process{}",
        match holder { Some(pid) => format!(" (pid {pid})"), None => String::new() }
    )]
    LockHeld { path: PathBuf, holder: Option<u32> },

    #[error("collection store is corrupt: {0}")]
    StoreCorrupt(String),

    #[error("store schema is version {found}, but this build expects version {expected}")]
    SchemaMismatch { found: u32, expected: u32 },

    #[error("collection directory does not exist: {0}")]
    DirectoryMissing(PathBuf),

    #[error("deck not found: {0}")]
    DeckNotFound(String),

    #[error("card {0} not found in the store")]
    CardMissing(mnemo_core::CardId),

    #[error("nothing to undo")]
    NothingToUndo,

    #[error(transparent)]
    Scheduler(#[from] SchedulerError),

    #[error("network failure during sync: {0}")]
    Network(String),

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, EngineError>;

impl EngineError {
    /// The process exit status for this error: the caller-facing contract
    /// distinguishes "collection in use" from every other failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            EngineError::LockHeld { .. } => 2,
            _ => 1,
        }
    }
}
