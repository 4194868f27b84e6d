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

//! Wire types for the sync protocol.
//!
//! A sync is two round trips. `begin` sends the client's checkpoint and
//! media manifest and gets back everything the server saw since that
//! checkpoint; `push` sends the client's local changes and commits the
//! new checkpoint on the server. Checkpoints are opaque to the client.

use std::collections::BTreeMap;

use mnemo_core::Card;
use mnemo_core::Deck;
use mnemo_core::Note;
use mnemo_core::ReviewLogEntry;
use serde::Deserialize;
use serde::Serialize;

/// Every record changed since a checkpoint, in either direction.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ChangeBatch {
    pub decks: Vec<Deck>,
    pub notes: Vec<Note>,
    pub cards: Vec<Card>,
    pub logs: Vec<ReviewLogEntry>,
}

impl ChangeBatch {
    pub fn is_empty(&self) -> bool {
        self.decks.is_empty() && self.notes.is_empty() && self.cards.is_empty() && self.logs.is_empty()
    }

    pub fn len(&self) -> usize {
        self.decks.len() + self.notes.len() + self.cards.len() + self.logs.len()
    }
}

/// Media file name to blake3 content hash, hex encoded.
pub type MediaManifest = BTreeMap<String, String>;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BeginRequest {
    pub checkpoint: Option<String>,
    pub media: MediaManifest,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BeginResponse {
    /// Checkpoint to present when pushing.
    pub checkpoint: String,
    /// Remote changes since the client's checkpoint.
    pub batch: ChangeBatch,
    /// Media transfers needed to converge both stores.
    #[serde(default)]
    pub media_actions: Vec<MediaAction>,
}

/// One media transfer the server asked for, computed from the manifests
/// on both sides.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum MediaAction {
    /// The server has a file the client lacks (or an older copy of).
    Fetch { name: String },
    /// The client has a file the server lacks.
    Push { name: String },
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PushRequest {
    pub checkpoint: String,
    pub batch: ChangeBatch,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PushResponse {
    /// The checkpoint the client records once the push is accepted.
    pub checkpoint: String,
}
