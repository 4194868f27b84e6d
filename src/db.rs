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

//! Transactional persistence for the collection.
//!
//! All mutations go through [`Database::with_tx`]: either every write in
//! the closure becomes durably visible, or none do. SQLite's journal
//! rolls an interrupted transaction back on the next open. Reads outside
//! a transaction see only committed data; exclusivity across processes
//! is the lock manager's job.

use std::collections::BTreeMap;
use std::path::Path;

use mnemo_core::Card;
use mnemo_core::CardId;
use mnemo_core::CollectionMeta;
use mnemo_core::Date;
use mnemo_core::DayCounts;
use mnemo_core::Deck;
use mnemo_core::DeckId;
use mnemo_core::Ease;
use mnemo_core::Grade;
use mnemo_core::LogId;
use mnemo_core::LostField;
use mnemo_core::Note;
use mnemo_core::NoteId;
use mnemo_core::Queue;
use mnemo_core::ReviewLogEntry;
use mnemo_core::StateKind;
use mnemo_core::Timestamp;
use rusqlite::Connection;
use rusqlite::OptionalExtension;
use rusqlite::Row;
use rusqlite::Transaction;
use rusqlite::params;

use crate::error::EngineError;
use crate::error::Result;

/// The on-disk schema version this build reads and writes.
pub const SCHEMA_VERSION: u32 = 1;

const SCHEMA: &str = r#"
CREATE TABLE meta (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    schema_version INTEGER NOT NULL,
    checkpoint TEXT,
    last_synced_at INTEGER NOT NULL,
    created_at INTEGER NOT NULL,
    params TEXT NOT NULL
);

CREATE TABLE decks (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL UNIQUE,
    parent_id INTEGER REFERENCES decks (id),
    new_per_day INTEGER NOT NULL,
    reviews_per_day INTEGER NOT NULL,
    modified_at INTEGER NOT NULL
);

CREATE TABLE notes (
    id INTEGER PRIMARY KEY,
    tags TEXT NOT NULL,
    fields TEXT NOT NULL,
    modified_at INTEGER NOT NULL
);

CREATE TABLE cards (
    id INTEGER PRIMARY KEY,
    note_id INTEGER NOT NULL REFERENCES notes (id),
    deck_id INTEGER NOT NULL REFERENCES decks (id),
    queue TEXT NOT NULL,
    step INTEGER,
    due INTEGER,
    interval_days INTEGER NOT NULL,
    ease INTEGER NOT NULL,
    lapses INTEGER NOT NULL,
    suspended INTEGER NOT NULL,
    buried_until INTEGER,
    modified_at INTEGER NOT NULL
);
CREATE INDEX idx_cards_deck ON cards (deck_id);
CREATE INDEX idx_cards_queue_due ON cards (queue, due);

CREATE TABLE review_log (
    id INTEGER PRIMARY KEY,
    card_id INTEGER NOT NULL REFERENCES cards (id),
    reviewed_at INTEGER NOT NULL,
    grade TEXT NOT NULL,
    state_before TEXT NOT NULL,
    state_after TEXT NOT NULL,
    interval_before INTEGER NOT NULL,
    interval_after INTEGER NOT NULL,
    ease_after INTEGER NOT NULL,
    taken_millis INTEGER NOT NULL
);
CREATE INDEX idx_review_log_card ON review_log (card_id, reviewed_at);
CREATE INDEX idx_review_log_reviewed_at ON review_log (reviewed_at);

CREATE TABLE conflict_log (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    entity TEXT NOT NULL,
    entity_id INTEGER NOT NULL,
    field TEXT NOT NULL,
    discarded TEXT NOT NULL,
    discarded_at INTEGER NOT NULL,
    recorded_at INTEGER NOT NULL
);
"#;

/// A handle on the collection store.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the store, initializing the schema on first use. An existing
    /// store whose schema version differs from [`SCHEMA_VERSION`] fails
    /// fast with `SchemaMismatch` rather than migrating silently.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(corrupt)?;
        conn.pragma_update(None, "foreign_keys", true)?;

        let initialized: bool = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'meta'",
                [],
                |row| row.get::<_, i64>(0),
            )
            .map_err(corrupt)?
            > 0;

        if !initialized {
            log::info!("initializing new collection store at {}", path.display());
            conn.execute_batch(SCHEMA)?;
            let meta = CollectionMeta::new(SCHEMA_VERSION, Timestamp::now());
            write_meta(&conn, &meta)?;
            return Ok(Database { conn });
        }

        let found: u32 = conn
            .query_row("SELECT schema_version FROM meta WHERE id = 1", [], |row| {
                row.get(0)
            })
            .map_err(corrupt)?;
        if found != SCHEMA_VERSION {
            return Err(EngineError::SchemaMismatch {
                found,
                expected: SCHEMA_VERSION,
            });
        }
        Ok(Database { conn })
    }

    /// An in-memory store, for tests.
    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.pragma_update(None, "foreign_keys", true)?;
        conn.execute_batch(SCHEMA)?;
        let meta = CollectionMeta::new(SCHEMA_VERSION, Timestamp::now());
        write_meta(&conn, &meta)?;
        Ok(Database { conn })
    }

    #[cfg(test)]
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Run `f` inside a transaction. The transaction commits if `f`
    /// returns `Ok` and rolls back otherwise; no partial write is ever
    /// visible.
    pub fn with_tx<T>(&mut self, f: impl FnOnce(&Transaction) -> Result<T>) -> Result<T> {
        let tx = self.conn.transaction()?;
        let out = f(&tx)?;
        tx.commit()?;
        Ok(out)
    }

    pub fn meta(&self) -> Result<CollectionMeta> {
        read_meta(&self.conn)
    }

    pub fn card(&self, id: CardId) -> Result<Option<Card>> {
        get_card(&self.conn, id)
    }

    pub fn cards(&self) -> Result<Vec<Card>> {
        all_cards(&self.conn)
    }

    pub fn note(&self, id: NoteId) -> Result<Option<Note>> {
        get_note(&self.conn, id)
    }

    pub fn notes(&self) -> Result<Vec<Note>> {
        all_notes(&self.conn)
    }

    /// Non-suspended cards sharing this card's note.
    pub fn siblings_of(&self, card: &Card) -> Result<Vec<Card>> {
        let mut siblings = cards_for_note(&self.conn, card.note_id)?;
        siblings.retain(|c| c.id != card.id && !c.suspended);
        Ok(siblings)
    }

    pub fn decks(&self) -> Result<BTreeMap<DeckId, Deck>> {
        all_decks(&self.conn)
    }

    pub fn deck_by_name(&self, name: &str) -> Result<Option<Deck>> {
        find_deck_by_name(&self.conn, name)
    }

    pub fn logs(&self) -> Result<Vec<ReviewLogEntry>> {
        all_logs(&self.conn)
    }

    /// Per-deck counts of today's answered cards, derived from the review
    /// log. The queue builder subtracts these from the daily limits.
    pub fn day_counts(&self, today: Date) -> Result<BTreeMap<DeckId, DayCounts>> {
        day_counts(&self.conn, today)
    }

    pub fn decks_changed_since(&self, since: Timestamp) -> Result<Vec<Deck>> {
        decks_changed_since(&self.conn, since)
    }

    pub fn notes_changed_since(&self, since: Timestamp) -> Result<Vec<Note>> {
        notes_changed_since(&self.conn, since)
    }

    pub fn cards_changed_since(&self, since: Timestamp) -> Result<Vec<Card>> {
        cards_changed_since(&self.conn, since)
    }

    pub fn logs_since(&self, since: Timestamp) -> Result<Vec<ReviewLogEntry>> {
        logs_since(&self.conn, since)
    }

    pub fn conflict_count(&self) -> Result<u64> {
        conflict_count(&self.conn)
    }
}

fn corrupt(err: rusqlite::Error) -> EngineError {
    EngineError::StoreCorrupt(err.to_string())
}

/// Decode failures are corruption: the value came from our own schema.
fn decode_err(msg: impl Into<String>) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        0,
        rusqlite::types::Type::Text,
        msg.into().into(),
    )
}

// ---------------------------------------------------------------------
// Meta
// ---------------------------------------------------------------------

pub fn read_meta(conn: &Connection) -> Result<CollectionMeta> {
    let meta = conn.query_row("SELECT schema_version, checkpoint, last_synced_at, created_at, params FROM meta WHERE id = 1", [], |row| {
        let params_json: String = row.get(4)?;
        let params = serde_json::from_str(&params_json)
            .map_err(|e| decode_err(format!("bad scheduler params: {e}")))?;
        Ok(CollectionMeta {
            schema_version: row.get(0)?,
            checkpoint: row.get(1)?,
            last_synced_at: Timestamp::from_unix_millis(row.get(2)?),
            created_at: Timestamp::from_unix_millis(row.get(3)?),
            params,
        })
    })?;
    Ok(meta)
}

pub fn write_meta(conn: &Connection, meta: &CollectionMeta) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO meta (id, schema_version, checkpoint, last_synced_at, created_at, params)
         VALUES (1, ?1, ?2, ?3, ?4, ?5)",
        params![
            meta.schema_version,
            meta.checkpoint,
            meta.last_synced_at.as_unix_millis(),
            meta.created_at.as_unix_millis(),
            serde_json::to_string(&meta.params)?,
        ],
    )?;
    Ok(())
}

// ---------------------------------------------------------------------
// Decks
// ---------------------------------------------------------------------

pub fn upsert_deck(conn: &Connection, deck: &Deck) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO decks (id, name, parent_id, new_per_day, reviews_per_day, modified_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            deck.id.into_inner(),
            deck.name,
            deck.parent.map(|p| p.into_inner()),
            deck.new_per_day,
            deck.reviews_per_day,
            deck.modified_at.as_unix_millis(),
        ],
    )?;
    Ok(())
}

fn row_to_deck(row: &Row) -> rusqlite::Result<Deck> {
    Ok(Deck {
        id: DeckId::new(row.get(0)?),
        name: row.get(1)?,
        parent: row.get::<_, Option<i64>>(2)?.map(DeckId::new),
        new_per_day: row.get(3)?,
        reviews_per_day: row.get(4)?,
        modified_at: Timestamp::from_unix_millis(row.get(5)?),
    })
}

const DECK_COLS: &str = "id, name, parent_id, new_per_day, reviews_per_day, modified_at";

pub fn get_deck(conn: &Connection, id: DeckId) -> Result<Option<Deck>> {
    let deck = conn
        .query_row(
            &format!("SELECT {DECK_COLS} FROM decks WHERE id = ?1"),
            params![id.into_inner()],
            row_to_deck,
        )
        .optional()?;
    Ok(deck)
}

pub fn all_decks(conn: &Connection) -> Result<BTreeMap<DeckId, Deck>> {
    let mut stmt = conn.prepare(&format!("SELECT {DECK_COLS} FROM decks"))?;
    let decks = stmt
        .query_map([], row_to_deck)?
        .collect::<rusqlite::Result<Vec<Deck>>>()?;
    Ok(decks.into_iter().map(|d| (d.id, d)).collect())
}

pub fn find_deck_by_name(conn: &Connection, name: &str) -> Result<Option<Deck>> {
    let deck = conn
        .query_row(
            &format!("SELECT {DECK_COLS} FROM decks WHERE name = ?1"),
            params![name],
            row_to_deck,
        )
        .optional()?;
    Ok(deck)
}

pub fn decks_changed_since(conn: &Connection, since: Timestamp) -> Result<Vec<Deck>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {DECK_COLS} FROM decks WHERE modified_at > ?1 ORDER BY id"
    ))?;
    let decks = stmt
        .query_map(params![since.as_unix_millis()], row_to_deck)?
        .collect::<rusqlite::Result<Vec<Deck>>>()?;
    Ok(decks)
}

// ---------------------------------------------------------------------
// Notes
// ---------------------------------------------------------------------

pub fn upsert_note(conn: &Connection, note: &Note) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO notes (id, tags, fields, modified_at) VALUES (?1, ?2, ?3, ?4)",
        params![
            note.id.into_inner(),
            serde_json::to_string(&note.tags)?,
            serde_json::to_string(&note.fields)?,
            note.modified_at.as_unix_millis(),
        ],
    )?;
    Ok(())
}

fn row_to_note(row: &Row) -> rusqlite::Result<Note> {
    let tags: String = row.get(1)?;
    let fields: String = row.get(2)?;
    Ok(Note {
        id: NoteId::new(row.get(0)?),
        tags: serde_json::from_str(&tags).map_err(|e| decode_err(format!("bad tags: {e}")))?,
        fields: serde_json::from_str(&fields)
            .map_err(|e| decode_err(format!("bad note fields: {e}")))?,
        modified_at: Timestamp::from_unix_millis(row.get(3)?),
    })
}

pub fn get_note(conn: &Connection, id: NoteId) -> Result<Option<Note>> {
    let note = conn
        .query_row(
            "SELECT id, tags, fields, modified_at FROM notes WHERE id = ?1",
            params![id.into_inner()],
            row_to_note,
        )
        .optional()?;
    Ok(note)
}

pub fn all_notes(conn: &Connection) -> Result<Vec<Note>> {
    let mut stmt = conn.prepare("SELECT id, tags, fields, modified_at FROM notes ORDER BY id")?;
    let notes = stmt
        .query_map([], row_to_note)?
        .collect::<rusqlite::Result<Vec<Note>>>()?;
    Ok(notes)
}

pub fn notes_changed_since(conn: &Connection, since: Timestamp) -> Result<Vec<Note>> {
    let mut stmt = conn.prepare(
        "SELECT id, tags, fields, modified_at FROM notes WHERE modified_at > ?1 ORDER BY id",
    )?;
    let notes = stmt
        .query_map(params![since.as_unix_millis()], row_to_note)?
        .collect::<rusqlite::Result<Vec<Note>>>()?;
    Ok(notes)
}

// ---------------------------------------------------------------------
// Cards
// ---------------------------------------------------------------------

/// The queue variant is stored as (kind, step, due): short-term states
/// put an instant in `due`, the review state puts a day number there.
fn encode_queue(queue: Queue) -> (&'static str, Option<u32>, Option<i64>) {
    match queue {
        Queue::New => ("new", None, None),
        Queue::Learning { step, due_at } => ("learning", Some(step), Some(due_at.as_unix_millis())),
        Queue::Review { due_on } => ("review", None, Some(due_on.unix_days() as i64)),
        Queue::Relearning { step, due_at } => {
            ("relearning", Some(step), Some(due_at.as_unix_millis()))
        }
    }
}

fn decode_queue(kind: &str, step: Option<u32>, due: Option<i64>) -> rusqlite::Result<Queue> {
    match (kind, step, due) {
        ("new", None, None) => Ok(Queue::New),
        ("learning", Some(step), Some(due)) => Ok(Queue::Learning {
            step,
            due_at: Timestamp::from_unix_millis(due),
        }),
        ("review", None, Some(due)) => Ok(Queue::Review {
            due_on: Date::from_unix_days(due as i32),
        }),
        ("relearning", Some(step), Some(due)) => Ok(Queue::Relearning {
            step,
            due_at: Timestamp::from_unix_millis(due),
        }),
        _ => Err(decode_err(format!(
            "invalid queue encoding: kind={kind} step={step:?} due={due:?}"
        ))),
    }
}

pub fn upsert_card(conn: &Connection, card: &Card) -> Result<()> {
    let (kind, step, due) = encode_queue(card.queue);
    conn.execute(
        "INSERT OR REPLACE INTO cards
         (id, note_id, deck_id, queue, step, due, interval_days, ease, lapses, suspended, buried_until, modified_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        params![
            card.id.into_inner(),
            card.note_id.into_inner(),
            card.deck_id.into_inner(),
            kind,
            step,
            due,
            card.interval_days,
            card.ease.permille(),
            card.lapses,
            card.suspended,
            card.buried_until.map(|d| d.unix_days()),
            card.modified_at.as_unix_millis(),
        ],
    )?;
    Ok(())
}

fn row_to_card(row: &Row) -> rusqlite::Result<Card> {
    let kind: String = row.get(3)?;
    let queue = decode_queue(&kind, row.get(4)?, row.get(5)?)?;
    Ok(Card {
        id: CardId::new(row.get(0)?),
        note_id: NoteId::new(row.get(1)?),
        deck_id: DeckId::new(row.get(2)?),
        queue,
        interval_days: row.get(6)?,
        ease: Ease::from_permille(row.get(7)?),
        lapses: row.get(8)?,
        suspended: row.get(9)?,
        buried_until: row
            .get::<_, Option<i32>>(10)?
            .map(Date::from_unix_days),
        modified_at: Timestamp::from_unix_millis(row.get(11)?),
    })
}

const CARD_COLS: &str = "id, note_id, deck_id, queue, step, due, interval_days, ease, lapses, suspended, buried_until, modified_at";

pub fn get_card(conn: &Connection, id: CardId) -> Result<Option<Card>> {
    let card = conn
        .query_row(
            &format!("SELECT {CARD_COLS} FROM cards WHERE id = ?1"),
            params![id.into_inner()],
            row_to_card,
        )
        .optional()?;
    Ok(card)
}

pub fn all_cards(conn: &Connection) -> Result<Vec<Card>> {
    let mut stmt = conn.prepare(&format!("SELECT {CARD_COLS} FROM cards ORDER BY id"))?;
    let cards = stmt
        .query_map([], row_to_card)?
        .collect::<rusqlite::Result<Vec<Card>>>()?;
    Ok(cards)
}

pub fn cards_for_note(conn: &Connection, note_id: NoteId) -> Result<Vec<Card>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {CARD_COLS} FROM cards WHERE note_id = ?1 ORDER BY id"
    ))?;
    let cards = stmt
        .query_map(params![note_id.into_inner()], row_to_card)?
        .collect::<rusqlite::Result<Vec<Card>>>()?;
    Ok(cards)
}

pub fn cards_changed_since(conn: &Connection, since: Timestamp) -> Result<Vec<Card>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {CARD_COLS} FROM cards WHERE modified_at > ?1 ORDER BY id"
    ))?;
    let cards = stmt
        .query_map(params![since.as_unix_millis()], row_to_card)?
        .collect::<rusqlite::Result<Vec<Card>>>()?;
    Ok(cards)
}

// ---------------------------------------------------------------------
// Review log
// ---------------------------------------------------------------------

/// Log ids are the review instant in milliseconds, bumped past the last
/// assigned id when two reviews land on the same millisecond. Ids are
/// therefore unique and time-ordered, and stay unique across replicas
/// for sync purposes.
pub fn next_log_id(conn: &Connection, reviewed_at: Timestamp) -> Result<LogId> {
    let max: i64 = conn.query_row("SELECT COALESCE(MAX(id), 0) FROM review_log", [], |row| {
        row.get(0)
    })?;
    Ok(LogId::new(reviewed_at.as_unix_millis().max(max + 1)))
}

fn row_to_log(row: &Row) -> rusqlite::Result<ReviewLogEntry> {
    let grade: String = row.get(3)?;
    let state_before: String = row.get(4)?;
    let state_after: String = row.get(5)?;
    Ok(ReviewLogEntry {
        id: LogId::new(row.get(0)?),
        card_id: CardId::new(row.get(1)?),
        reviewed_at: Timestamp::from_unix_millis(row.get(2)?),
        grade: Grade::try_from(grade.as_str()).map_err(|e| decode_err(e.to_string()))?,
        state_before: StateKind::try_from(state_before.as_str())
            .map_err(|e| decode_err(e.to_string()))?,
        state_after: StateKind::try_from(state_after.as_str())
            .map_err(|e| decode_err(e.to_string()))?,
        interval_before: row.get(6)?,
        interval_after: row.get(7)?,
        ease_after: Ease::from_permille(row.get(8)?),
        taken_millis: row.get(9)?,
    })
}

const LOG_COLS: &str = "id, card_id, reviewed_at, grade, state_before, state_after, interval_before, interval_after, ease_after, taken_millis";

pub fn append_review_log(conn: &Connection, entry: &ReviewLogEntry) -> Result<()> {
    conn.execute(
        &format!(
            "INSERT INTO review_log ({LOG_COLS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)"
        ),
        params![
            entry.id.into_inner(),
            entry.card_id.into_inner(),
            entry.reviewed_at.as_unix_millis(),
            entry.grade.as_str(),
            entry.state_before.as_str(),
            entry.state_after.as_str(),
            entry.interval_before,
            entry.interval_after,
            entry.ease_after.permille(),
            entry.taken_millis,
        ],
    )?;
    Ok(())
}

/// Insert a log entry unless one with the same id already exists.
/// Replaying an already-applied sync batch is therefore a no-op.
pub fn insert_log_if_absent(conn: &Connection, entry: &ReviewLogEntry) -> Result<bool> {
    let inserted = conn.execute(
        &format!(
            "INSERT OR IGNORE INTO review_log ({LOG_COLS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)"
        ),
        params![
            entry.id.into_inner(),
            entry.card_id.into_inner(),
            entry.reviewed_at.as_unix_millis(),
            entry.grade.as_str(),
            entry.state_before.as_str(),
            entry.state_after.as_str(),
            entry.interval_before,
            entry.interval_after,
            entry.ease_after.permille(),
            entry.taken_millis,
        ],
    )?;
    Ok(inserted > 0)
}

/// Remove one log entry. Only the undo path calls this; the log is
/// otherwise append-only.
pub fn remove_review_log(conn: &Connection, id: LogId) -> Result<()> {
    conn.execute(
        "DELETE FROM review_log WHERE id = ?1",
        params![id.into_inner()],
    )?;
    Ok(())
}

pub fn all_logs(conn: &Connection) -> Result<Vec<ReviewLogEntry>> {
    let mut stmt = conn.prepare(&format!("SELECT {LOG_COLS} FROM review_log ORDER BY id"))?;
    let logs = stmt
        .query_map([], row_to_log)?
        .collect::<rusqlite::Result<Vec<ReviewLogEntry>>>()?;
    Ok(logs)
}

pub fn logs_since(conn: &Connection, since: Timestamp) -> Result<Vec<ReviewLogEntry>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {LOG_COLS} FROM review_log WHERE reviewed_at > ?1 ORDER BY id"
    ))?;
    let logs = stmt
        .query_map(params![since.as_unix_millis()], row_to_log)?
        .collect::<rusqlite::Result<Vec<ReviewLogEntry>>>()?;
    Ok(logs)
}

pub fn day_counts(conn: &Connection, today: Date) -> Result<BTreeMap<DeckId, DayCounts>> {
    let start = today.unix_days() as i64 * 86_400_000;
    let end = start + 86_400_000;
    let mut stmt = conn.prepare(
        "SELECT c.deck_id, l.state_before, COUNT(*)
         FROM review_log l JOIN cards c ON c.id = l.card_id
         WHERE l.reviewed_at >= ?1 AND l.reviewed_at < ?2
           AND l.state_before IN ('new', 'review')
         GROUP BY c.deck_id, l.state_before",
    )?;
    let rows = stmt
        .query_map(params![start, end], |row| {
            Ok((
                DeckId::new(row.get(0)?),
                row.get::<_, String>(1)?,
                row.get::<_, u32>(2)?,
            ))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    let mut counts: BTreeMap<DeckId, DayCounts> = BTreeMap::new();
    for (deck_id, state, count) in rows {
        let entry = counts.entry(deck_id).or_default();
        match state.as_str() {
            "new" => entry.new_taken = count,
            _ => entry.reviews_taken = count,
        }
    }
    Ok(counts)
}

// ---------------------------------------------------------------------
// Conflict log
// ---------------------------------------------------------------------

/// Record a merge loser. Conflicts are resolved automatically but never
/// silently dropped.
pub fn append_conflict(
    conn: &Connection,
    entity: &str,
    entity_id: i64,
    field: &str,
    discarded: &str,
    discarded_at: Timestamp,
    recorded_at: Timestamp,
) -> Result<()> {
    conn.execute(
        "INSERT INTO conflict_log (entity, entity_id, field, discarded, discarded_at, recorded_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            entity,
            entity_id,
            field,
            discarded,
            discarded_at.as_unix_millis(),
            recorded_at.as_unix_millis(),
        ],
    )?;
    Ok(())
}

pub fn append_field_conflicts(
    conn: &Connection,
    lost: &[LostField],
    recorded_at: Timestamp,
) -> Result<()> {
    for field in lost {
        append_conflict(
            conn,
            "note",
            field.note_id.into_inner(),
            &field.field,
            &field.discarded_text,
            field.discarded_at,
            recorded_at,
        )?;
    }
    Ok(())
}

pub fn conflict_count(conn: &Connection) -> Result<u64> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM conflict_log", [], |row| row.get(0))?;
    Ok(count as u64)
}
