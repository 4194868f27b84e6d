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

//! Reconciliation against a sync server.
//!
//! The merge rules differ by record kind. Notes merge per field under
//! last-writer-wins, so concurrent edits to different fields of the same
//! note both survive; a field both sides edited keeps the later value and
//! records the loser in the conflict log. Cards and decks merge as whole
//! records. Review logs are append-only facts and merge by union.
//!
//! All network traffic happens before the local transaction opens. The
//! remote batch, the checkpoint, and the sync timestamp commit together;
//! a crash mid-sync leaves the old checkpoint in place and the next sync
//! repeats the work idempotently.

pub mod client;
pub mod envelope;
pub mod media;

use std::fs;
use std::path::Path;

use mnemo_core::Note;
use mnemo_core::Timestamp;

use crate::db;
use crate::db::Database;
use crate::error::EngineError;
use crate::error::Result;
use crate::sync::client::SyncClient;
use crate::sync::envelope::BeginRequest;
use crate::sync::envelope::ChangeBatch;
use crate::sync::envelope::MediaAction;
use crate::sync::envelope::PushRequest;

/// What a completed sync did.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub pushed: usize,
    pub pulled: usize,
    /// Field values discarded by note merges this sync.
    pub conflicts: usize,
    pub media_fetched: usize,
    pub media_pushed: usize,
    pub checkpoint: String,
}

/// Run one full sync round against the server.
pub async fn reconcile(
    db: &mut Database,
    media_dir: &Path,
    client: &SyncClient,
) -> Result<SyncReport> {
    let meta = db.meta()?;
    let since = meta.last_synced_at;

    let outgoing = ChangeBatch {
        decks: db.decks_changed_since(since)?,
        notes: db.notes_changed_since(since)?,
        cards: db.cards_changed_since(since)?,
        logs: db.logs_since(since)?,
    };
    let manifest = media::build_manifest(media_dir)?;
    log::info!(
        "sync: pushing {} changed records, {} media files known",
        outgoing.len(),
        manifest.len()
    );

    let begin = client
        .begin(&BeginRequest {
            checkpoint: meta.checkpoint.clone(),
            media: manifest,
        })
        .await?;
    let pushed = outgoing.len();
    let push = client
        .push(&PushRequest {
            checkpoint: begin.checkpoint.clone(),
            batch: outgoing,
        })
        .await?;

    let now = Timestamp::now();
    let pulled = begin.batch.len();
    let conflicts = db.with_tx(|tx| {
        let conflicts = apply_remote(tx, &begin.batch, now)?;
        let mut meta = db::read_meta(tx)?;
        meta.checkpoint = Some(push.checkpoint.clone());
        meta.last_synced_at = now;
        db::write_meta(tx, &meta)?;
        Ok(conflicts)
    })?;

    let (media_fetched, media_pushed) =
        transfer_media(media_dir, client, &begin.media_actions).await?;

    Ok(SyncReport {
        pushed,
        pulled,
        conflicts,
        media_fetched,
        media_pushed,
        checkpoint: push.checkpoint,
    })
}

/// Merge a remote batch into the store. Returns how many field values
/// lost a merge.
fn apply_remote(
    conn: &rusqlite::Connection,
    batch: &ChangeBatch,
    now: Timestamp,
) -> Result<usize> {
    for deck in &batch.decks {
        let keep_local = matches!(
            db::get_deck(conn, deck.id)?,
            Some(local) if local.modified_at >= deck.modified_at
        );
        if !keep_local {
            db::upsert_deck(conn, deck)?;
        }
    }

    let mut conflicts = 0;
    for note in &batch.notes {
        match db::get_note(conn, note.id)? {
            Some(local) => {
                let (merged, lost) = Note::merge(&local, note);
                db::upsert_note(conn, &merged)?;
                db::append_field_conflicts(conn, &lost, now)?;
                conflicts += lost.len();
            }
            None => db::upsert_note(conn, note)?,
        }
    }

    for card in &batch.cards {
        let keep_local = matches!(
            db::get_card(conn, card.id)?,
            Some(local) if local.modified_at >= card.modified_at
        );
        if !keep_local {
            db::upsert_card(conn, card)?;
        }
    }

    for entry in &batch.logs {
        db::insert_log_if_absent(conn, entry)?;
    }
    Ok(conflicts)
}

/// Resolve a server-supplied media name under the media directory. The
/// name is untrusted input: anything but plain relative components is
/// rejected, so a hostile server can neither write outside the
/// collection nor read arbitrary files through a push action.
fn media_path(media_dir: &Path, name: &str) -> Result<std::path::PathBuf> {
    let relative = Path::new(name);
    let plain = !name.is_empty()
        && relative
            .components()
            .all(|c| matches!(c, std::path::Component::Normal(_)));
    if !plain {
        return Err(EngineError::Network(format!(
            "server sent unsafe media name: {name:?}"
        )));
    }
    Ok(media_dir.join(relative))
}

async fn transfer_media(
    media_dir: &Path,
    client: &SyncClient,
    actions: &[MediaAction],
) -> Result<(usize, usize)> {
    let mut fetched = 0;
    let mut pushed = 0;
    for action in actions {
        match action {
            MediaAction::Fetch { name } => {
                let target = media_path(media_dir, name)?;
                let contents = client.fetch_media(name).await?;
                if let Some(parent) = target.parent() {
                    fs::create_dir_all(parent)?;
                }
                fs::write(target, contents)?;
                fetched += 1;
            }
            MediaAction::Push { name } => {
                let contents = fs::read(media_path(media_dir, name)?)?;
                client.push_media(name, contents).await?;
                pushed += 1;
            }
        }
    }
    Ok((fetched, pushed))
}
