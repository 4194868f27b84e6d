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

use serde::Deserialize;
use serde::Serialize;

use crate::types::ease::Ease;
use crate::types::grade::Grade;
use crate::types::ids::CardId;
use crate::types::ids::LogId;
use crate::types::queue::StateKind;
use crate::types::timestamp::Timestamp;

/// One answered review. Append-only: entries are never mutated and never
/// deleted, except that undoing an answer removes the entry it created.
/// This is the audit trail sync reconciliation depends on.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct ReviewLogEntry {
    pub id: LogId,
    pub card_id: CardId,
    pub reviewed_at: Timestamp,
    pub grade: Grade,
    pub state_before: StateKind,
    pub state_after: StateKind,
    pub interval_before: u32,
    pub interval_after: u32,
    pub ease_after: Ease,
    /// Time the user spent answering, in milliseconds.
    pub taken_millis: u32,
}
