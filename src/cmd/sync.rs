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

use std::path::Path;

use crate::collection::Collection;
use crate::collection::resolve_directory;
use crate::error::EngineError;
use crate::error::Result;
use crate::sync::client::SyncClient;
use crate::sync::client::TOKEN_ENV_VAR;
use crate::sync::reconcile;

pub async fn sync_collection(
    directory: Option<String>,
    endpoint: String,
    token: Option<String>,
    reclaim_stale_lock: bool,
) -> Result<()> {
    let token = match token.or_else(|| std::env::var(TOKEN_ENV_VAR).ok()) {
        Some(token) => token,
        None => {
            return Err(EngineError::Auth(format!(
                "no sync token: pass --token or set {TOKEN_ENV_VAR}"
            )));
        }
    };
    let directory = resolve_directory(directory.as_deref().map(Path::new))?;
    let mut collection = Collection::open(&directory, reclaim_stale_lock)?;
    let media_dir = collection.media_dir();
    let client = SyncClient::new(endpoint, token)?;

    let report = reconcile(&mut collection.db, &media_dir, &client).await?;
    println!(
        "Synced: {} pushed, {} pulled, {} media fetched, {} media pushed.",
        report.pushed, report.pulled, report.media_fetched, report.media_pushed
    );
    if report.conflicts > 0 {
        println!(
            "{} field conflicts were resolved; losing values are in the conflict log.",
            report.conflicts
        );
    }
    Ok(())
}
