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

use clap::Parser;

use crate::cmd::check::check_collection;
use crate::cmd::export::export_collection;
use crate::cmd::export::import_collection;
use crate::cmd::review::review_collection;
use crate::cmd::sync::sync_collection;
use crate::error::Result;

#[derive(Parser)]
#[command(version, about, long_about = None)]
enum Command {
    /// Review due cards in the terminal.
    Review {
        /// Path to the collection directory. By default, MNEMO_DIR or the current working directory is used.
        directory: Option<String>,
        /// Only review cards from this deck and its subdecks.
        #[arg(long)]
        deck: Option<String>,
        /// Take over a lock left behind by a dead process.
        #[arg(long)]
        reclaim_stale_lock: bool,
    },
    /// Reconcile the collection with a sync server.
    Sync {
        /// Path to the collection directory. By default, MNEMO_DIR or the current working directory is used.
        directory: Option<String>,
        /// Base URL of the sync server.
        #[arg(long)]
        endpoint: String,
        /// Bearer token. Defaults to the MNEMO_SYNC_TOKEN environment variable.
        #[arg(long)]
        token: Option<String>,
        /// Take over a lock left behind by a dead process.
        #[arg(long)]
        reclaim_stale_lock: bool,
    },
    /// Check the integrity of a collection.
    Check {
        /// Path to the collection directory. By default, MNEMO_DIR or the current working directory is used.
        directory: Option<String>,
        /// Take over a lock left behind by a dead process.
        #[arg(long)]
        reclaim_stale_lock: bool,
    },
    /// Export a collection as JSON.
    Export {
        /// Path to the collection directory. By default, MNEMO_DIR or the current working directory is used.
        directory: Option<String>,
        /// Optional path to the output file. By default, the output is printed to stdout.
        #[arg(long)]
        output: Option<String>,
        /// Take over a lock left behind by a dead process.
        #[arg(long)]
        reclaim_stale_lock: bool,
    },
    /// Import a JSON export into a collection.
    Import {
        /// Path to the collection directory. By default, MNEMO_DIR or the current working directory is used.
        directory: Option<String>,
        /// Path to the JSON file to import.
        #[arg(long)]
        input: String,
        /// Take over a lock left behind by a dead process.
        #[arg(long)]
        reclaim_stale_lock: bool,
    },
}

pub async fn entrypoint() -> Result<()> {
    let cli: Command = Command::parse();
    match cli {
        Command::Review {
            directory,
            deck,
            reclaim_stale_lock,
        } => review_collection(directory, deck, reclaim_stale_lock),
        Command::Sync {
            directory,
            endpoint,
            token,
            reclaim_stale_lock,
        } => sync_collection(directory, endpoint, token, reclaim_stale_lock).await,
        Command::Check {
            directory,
            reclaim_stale_lock,
        } => check_collection(directory, reclaim_stale_lock),
        Command::Export {
            directory,
            output,
            reclaim_stale_lock,
        } => export_collection(directory, output, reclaim_stale_lock),
        Command::Import {
            directory,
            input,
            reclaim_stale_lock,
        } => import_collection(directory, input, reclaim_stale_lock),
    }
}
