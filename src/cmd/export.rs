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

//! Collection export and import as a single JSON document.
//!
//! The export carries records and scheduler parameters but no checkpoint:
//! an imported copy is a new replica, not a clone of the source's sync
//! state.

use std::fs;
use std::path::Path;

use mnemo_core::Card;
use mnemo_core::Deck;
use mnemo_core::Note;
use mnemo_core::ReviewLogEntry;
use mnemo_core::SchedulerParams;
use serde::Deserialize;
use serde::Serialize;

use crate::collection::Collection;
use crate::collection::resolve_directory;
use crate::db;
use crate::db::Database;
use crate::error::Result;

#[derive(Serialize, Deserialize)]
pub struct CollectionExport {
    pub params: SchedulerParams,
    pub decks: Vec<Deck>,
    pub notes: Vec<Note>,
    pub cards: Vec<Card>,
    pub logs: Vec<ReviewLogEntry>,
}

pub fn export_collection(
    directory: Option<String>,
    output: Option<String>,
    reclaim_stale_lock: bool,
) -> Result<()> {
    let directory = resolve_directory(directory.as_deref().map(Path::new))?;
    let collection = Collection::open(&directory, reclaim_stale_lock)?;
    let export = snapshot(&collection.db)?;
    let json = serde_json::to_string_pretty(&export)?;
    match output {
        Some(path) => fs::write(path, json)?,
        None => println!("{json}"),
    }
    Ok(())
}

pub fn import_collection(
    directory: Option<String>,
    input: String,
    reclaim_stale_lock: bool,
) -> Result<()> {
    let directory = resolve_directory(directory.as_deref().map(Path::new))?;
    let mut collection = Collection::open(&directory, reclaim_stale_lock)?;
    let export: CollectionExport = serde_json::from_str(&fs::read_to_string(input)?)?;
    let imported = apply(&mut collection.db, &export)?;
    println!("Imported {imported} records.");
    Ok(())
}

pub fn snapshot(db: &Database) -> Result<CollectionExport> {
    Ok(CollectionExport {
        params: db.meta()?.params,
        decks: db.decks()?.into_values().collect(),
        notes: db.notes()?,
        cards: db.cards()?,
        logs: db.logs()?,
    })
}

/// Load an export into the store. Records land as upserts and log
/// entries as a union, so importing into a non-empty collection behaves
/// like a one-way merge.
pub fn apply(db: &mut Database, export: &CollectionExport) -> Result<usize> {
    db.with_tx(|tx| {
        let mut imported = 0;
        for deck in &export.decks {
            db::upsert_deck(tx, deck)?;
            imported += 1;
        }
        for note in &export.notes {
            db::upsert_note(tx, note)?;
            imported += 1;
        }
        for card in &export.cards {
            db::upsert_card(tx, card)?;
            imported += 1;
        }
        for entry in &export.logs {
            if db::insert_log_if_absent(tx, entry)? {
                imported += 1;
            }
        }
        let mut meta = db::read_meta(tx)?;
        meta.params = export.params.clone();
        db::write_meta(tx, &meta)?;
        Ok(imported)
    })
}
