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

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use serde::Deserialize;
use serde::Serialize;

use crate::types::ids::NoteId;
use crate::types::timestamp::Timestamp;

/// One field of a note. Each field carries its own modification timestamp
/// so that reconciliation can merge per field: two sides editing disjoint
/// fields of the same note conflict on neither.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct NoteField {
    pub text: String,
    pub modified_at: Timestamp,
}

/// A logical fact: a mapping of field name to text content, plus tags.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Note {
    pub id: NoteId,
    pub tags: BTreeSet<String>,
    pub modified_at: Timestamp,
    pub fields: BTreeMap<String, NoteField>,
}

/// A field value discarded during a merge. Recorded, never silently
/// dropped.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct LostField {
    pub note_id: NoteId,
    pub field: String,
    pub discarded_text: String,
    pub discarded_at: Timestamp,
}

impl Note {
    pub fn new(id: NoteId, created_at: Timestamp) -> Self {
        Note {
            id,
            tags: BTreeSet::new(),
            modified_at: created_at,
            fields: BTreeMap::new(),
        }
    }

    /// Set a field, bumping the field's and the note's modification times.
    pub fn set_field(&mut self, name: impl Into<String>, text: impl Into<String>, now: Timestamp) {
        self.fields.insert(
            name.into(),
            NoteField {
                text: text.into(),
                modified_at: now,
            },
        );
        self.modified_at = now;
    }

    /// Merge a remote copy of this note into the local one, per-field
    /// last-writer-wins. Returns the merged note and the losing values.
    ///
    /// Tags are merged by union; a tag set never loses entries to a merge.
    pub fn merge(local: &Note, remote: &Note) -> (Note, Vec<LostField>) {
        let mut merged = local.clone();
        let mut lost: Vec<LostField> = Vec::new();
        for (name, theirs) in remote.fields.iter() {
            match merged.fields.get(name) {
                Some(ours) if ours.modified_at >= theirs.modified_at => {
                    if ours.text != theirs.text {
                        lost.push(LostField {
                            note_id: local.id,
                            field: name.clone(),
                            discarded_text: theirs.text.clone(),
                            discarded_at: theirs.modified_at,
                        });
                    }
                }
                Some(ours) => {
                    if ours.text != theirs.text {
                        lost.push(LostField {
                            note_id: local.id,
                            field: name.clone(),
                            discarded_text: ours.text.clone(),
                            discarded_at: ours.modified_at,
                        });
                    }
                    merged.fields.insert(name.clone(), theirs.clone());
                }
                None => {
                    merged.fields.insert(name.clone(), theirs.clone());
                }
            }
        }
        merged.tags.extend(remote.tags.iter().cloned());
        merged.modified_at = local.modified_at.max(remote.modified_at);
        (merged, lost)
    }
}
