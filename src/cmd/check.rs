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

//! Referential integrity checks over a collection.

use std::collections::BTreeSet;
use std::path::Path;

use mnemo_core::parents_acyclic;

use crate::collection::Collection;
use crate::collection::resolve_directory;
use crate::db::Database;
use crate::error::EngineError;
use crate::error::Result;

pub fn check_collection(directory: Option<String>, reclaim_stale_lock: bool) -> Result<()> {
    let directory = resolve_directory(directory.as_deref().map(Path::new))?;
    let collection = Collection::open(&directory, reclaim_stale_lock)?;
    let problems = find_problems(&collection.db)?;
    for problem in &problems {
        println!("{problem}");
    }
    if problems.is_empty() {
        println!("Collection is consistent.");
        Ok(())
    } else {
        Err(EngineError::StoreCorrupt(format!(
            "collection failed {} checks",
            problems.len()
        )))
    }
}

fn find_problems(db: &Database) -> Result<Vec<String>> {
    let decks = db.decks()?;
    let cards = db.cards()?;
    let floor = db.meta()?.params.minimum_ease;
    let note_ids: BTreeSet<_> = db.notes()?.into_iter().map(|n| n.id).collect();
    let card_ids: BTreeSet<_> = cards.iter().map(|c| c.id).collect();

    let mut problems = Vec::new();
    if !parents_acyclic(&decks) {
        problems.push("deck parent chain contains a cycle".to_string());
    }
    for deck in decks.values() {
        if let Some(parent) = deck.parent {
            if !decks.contains_key(&parent) {
                problems.push(format!(
                    "deck {} ({}) has missing parent {parent}",
                    deck.id, deck.name
                ));
            }
        }
    }
    for card in &cards {
        if !note_ids.contains(&card.note_id) {
            problems.push(format!("card {} points at missing note {}", card.id, card.note_id));
        }
        if !decks.contains_key(&card.deck_id) {
            problems.push(format!("card {} points at missing deck {}", card.id, card.deck_id));
        }
        if card.ease < floor {
            problems.push(format!(
                "card {} has ease {} below the floor {floor}",
                card.id, card.ease
            ));
        }
    }
    // Log ids are assigned in time order, so per card the id order and
    // the reviewed_at order must agree.
    let mut last_reviewed: std::collections::BTreeMap<_, mnemo_core::Timestamp> =
        std::collections::BTreeMap::new();
    for entry in db.logs()? {
        if !card_ids.contains(&entry.card_id) {
            problems.push(format!(
                "review log entry {} points at missing card {}",
                entry.id, entry.card_id
            ));
        }
        if let Some(&prior) = last_reviewed.get(&entry.card_id) {
            if entry.reviewed_at < prior {
                problems.push(format!(
                    "review log entry {} for card {} is out of order",
                    entry.id, entry.card_id
                ));
            }
        }
        last_reviewed.insert(entry.card_id, entry.reviewed_at);
    }
    Ok(problems)
}

#[cfg(test)]
mod tests {
    use mnemo_core::Card;
    use mnemo_core::CardId;
    use mnemo_core::Deck;
    use mnemo_core::DeckId;
    use mnemo_core::Ease;
    use mnemo_core::Note;
    use mnemo_core::NoteId;
    use mnemo_core::Timestamp;

    use super::*;
    use crate::db;

    fn at0() -> Timestamp {
        Timestamp::from_unix_millis(0)
    }

    #[test]
    fn test_consistent_collection_has_no_problems() {
        let mut db = Database::open_in_memory().unwrap();
        db.with_tx(|tx| {
            db::upsert_deck(tx, &Deck::new(DeckId::new(1), "Default", 20, 200, at0()))?;
            db::upsert_note(tx, &Note::new(NoteId::new(1), at0()))?;
            db::upsert_card(
                tx,
                &Card::new(
                    CardId::new(1),
                    NoteId::new(1),
                    DeckId::new(1),
                    Ease::from_permille(2500),
                    at0(),
                ),
            )?;
            Ok(())
        })
        .unwrap();
        assert!(find_problems(&db).unwrap().is_empty());
    }

    #[test]
    fn test_dangling_references_reported() {
        let mut db = Database::open_in_memory().unwrap();
        // Foreign keys are disabled here on purpose, to plant the kind of
        // inconsistency a sync or a crash could leave behind.
        db.connection()
            .pragma_update(None, "foreign_keys", false)
            .unwrap();
        db.with_tx(|tx| {
            db::upsert_card(
                tx,
                &Card::new(
                    CardId::new(1),
                    NoteId::new(99),
                    DeckId::new(99),
                    Ease::from_permille(2500),
                    at0(),
                ),
            )?;
            Ok(())
        })
        .unwrap();
        let problems = find_problems(&db).unwrap();
        assert_eq!(problems.len(), 2);
    }

    #[test]
    fn test_deck_cycle_reported() {
        let mut db = Database::open_in_memory().unwrap();
        // Foreign keys are disabled here on purpose, to plant the kind of
        // inconsistency a sync or a crash could leave behind.
        db.connection()
            .pragma_update(None, "foreign_keys", false)
            .unwrap();
        db.with_tx(|tx| {
            let mut a = Deck::new(DeckId::new(1), "A", 20, 200, at0());
            let mut b = Deck::new(DeckId::new(2), "B", 20, 200, at0());
            a.parent = Some(DeckId::new(2));
            b.parent = Some(DeckId::new(1));
            db::upsert_deck(tx, &a)?;
            db::upsert_deck(tx, &b)?;
            Ok(())
        })
        .unwrap();
        let problems = find_problems(&db).unwrap();
        assert_eq!(problems, vec!["deck parent chain contains a cycle"]);
    }
}
