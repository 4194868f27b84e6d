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

use crate::params::SchedulerParams;
use crate::types::timestamp::Timestamp;

/// Collection-wide state: schema version, sync checkpoint, scheduler
/// configuration. Created once at collection initialization; the
/// checkpoint advances on each successful sync.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct CollectionMeta {
    pub schema_version: u32,
    /// Opaque token naming the last synchronized point, issued by the
    /// server. `None` until the first successful sync.
    pub checkpoint: Option<String>,
    /// Local instant of the last successful sync; entities modified after
    /// this are "changed since the prior checkpoint".
    pub last_synced_at: Timestamp,
    pub created_at: Timestamp,
    pub params: SchedulerParams,
}

impl CollectionMeta {
    pub fn new(schema_version: u32, created_at: Timestamp) -> Self {
        CollectionMeta {
            schema_version,
            checkpoint: None,
            // The epoch, not `created_at`: the first sync must push every
            // record, including ones imported with older timestamps.
            last_synced_at: Timestamp::from_unix_millis(0),
            created_at,
            params: SchedulerParams::default(),
        }
    }
}
