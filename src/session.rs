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

//! A review session over one collection.
//!
//! The due queue is computed once when the session starts; answering a
//! card never reorders what was already scheduled, except that a card
//! still in a learning step is pushed to the back of the queue so it
//! comes around again before the session ends. Each answer commits in
//! its own transaction, so a killed process loses at most the answer in
//! flight.

use std::collections::VecDeque;

use mnemo_core::Card;
use mnemo_core::CardId;
use mnemo_core::DeckId;
use mnemo_core::Grade;
use mnemo_core::Queue;
use mnemo_core::ReviewLogEntry;
use mnemo_core::SchedulerParams;
use mnemo_core::Timestamp;
use mnemo_core::answer;
use mnemo_core::build_queue;

use crate::db;
use crate::db::Database;
use crate::error::EngineError;
use crate::error::Result;

/// How many answers can be taken back, most recent first.
const UNDO_DEPTH: usize = 10;

struct UndoFrame {
    card_before: Card,
    log_id: mnemo_core::LogId,
    buried_before: Vec<Card>,
}

/// What an answer did, for display.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AnswerOutcome {
    pub card_id: CardId,
    pub next_queue: Queue,
    pub interval_days: u32,
}

pub struct ReviewSession<'a> {
    db: &'a mut Database,
    params: SchedulerParams,
    queue: VecDeque<CardId>,
    undo_stack: VecDeque<UndoFrame>,
    answered: u32,
    last_instant: Timestamp,
}

impl<'a> ReviewSession<'a> {
    /// Snapshot the due queue for the given deck scope and start a
    /// session over it. An empty queue is a valid session.
    pub fn start(db: &'a mut Database, scope: Option<&str>) -> Result<Self> {
        let params = db.meta()?.params;
        let scope_id: Option<DeckId> = match scope {
            Some(name) => Some(
                db.deck_by_name(name)?
                    .ok_or_else(|| EngineError::DeckNotFound(name.to_string()))?
                    .id,
            ),
            None => None,
        };
        let now = Timestamp::now();
        let cards = db.cards()?;
        let decks = db.decks()?;
        let counts = db.day_counts(now.date())?;
        let queue = build_queue(&cards, &decks, scope_id, &counts, now);
        log::debug!("session queue holds {} cards", queue.len());
        Ok(ReviewSession {
            db,
            params,
            queue: queue.into(),
            undo_stack: VecDeque::new(),
            answered: 0,
            last_instant: now,
        })
    }

    /// The next card to show, or `None` when the session is finished.
    /// Entries whose card was deleted or deactivated since the queue was
    /// built are dropped here.
    pub fn next_card(&mut self) -> Result<Option<Card>> {
        let today = Timestamp::now().date();
        while let Some(&id) = self.queue.front() {
            match self.db.card(id)? {
                Some(card) if card.is_active(today) => return Ok(Some(card)),
                _ => {
                    self.queue.pop_front();
                }
            }
        }
        Ok(None)
    }

    /// The note behind a card, for display.
    pub fn note_for(&self, card: &Card) -> Result<Option<mnemo_core::Note>> {
        self.db.note(card.note_id)
    }

    pub fn remaining(&self) -> usize {
        self.queue.len()
    }

    pub fn answered(&self) -> usize {
        self.answered as usize
    }

    /// Answer the card at the front of the queue. The card update, the
    /// log entry, and any sibling burials commit together or not at all.
    /// Returns `None` when the queue is already empty.
    pub fn answer(&mut self, grade: Grade, taken_millis: u32) -> Result<Option<AnswerOutcome>> {
        let id = match self.queue.pop_front() {
            Some(id) => id,
            None => return Ok(None),
        };
        let card = self.db.card(id)?.ok_or(EngineError::CardMissing(id))?;
        let now = self.next_instant();
        let fuzz_seed = now.as_unix_millis() as u64;
        let answered = answer(&card, grade, now, &self.params, fuzz_seed)?;

        let siblings = to_bury(&self.db.siblings_of(&card)?, now);
        let (entry, buried_before) = self.db.with_tx(|tx| {
            let log_id = db::next_log_id(tx, now)?;
            let entry = ReviewLogEntry {
                id: log_id,
                card_id: card.id,
                reviewed_at: now,
                grade,
                state_before: answered.state_before,
                state_after: answered.card.queue.kind(),
                interval_before: answered.interval_before,
                interval_after: answered.card.interval_days,
                ease_after: answered.card.ease,
                taken_millis,
            };
            db::upsert_card(tx, &answered.card)?;
            db::append_review_log(tx, &entry)?;
            let mut buried_before = Vec::new();
            for sibling in &siblings {
                let mut updated = sibling.clone();
                updated.bury(now.date(), now);
                db::upsert_card(tx, &updated)?;
                buried_before.push(sibling.clone());
            }
            Ok((entry, buried_before))
        })?;

        self.push_undo(UndoFrame {
            card_before: card,
            log_id: entry.id,
            buried_before,
        });
        self.answered += 1;

        // A card still in a step comes around again this session.
        match answered.card.queue {
            Queue::Learning { .. } | Queue::Relearning { .. } => {
                self.queue.push_back(id);
            }
            _ => {}
        }

        Ok(Some(AnswerOutcome {
            card_id: id,
            next_queue: answered.card.queue,
            interval_days: answered.card.interval_days,
        }))
    }

    /// Take back the most recent answer: the card, its siblings, and the
    /// review log return to their prior state, and the card is put back
    /// at the front of the queue.
    pub fn undo(&mut self) -> Result<CardId> {
        let frame = self.undo_stack.pop_back().ok_or(EngineError::NothingToUndo)?;
        self.db.with_tx(|tx| {
            db::upsert_card(tx, &frame.card_before)?;
            db::remove_review_log(tx, frame.log_id)?;
            for sibling in &frame.buried_before {
                db::upsert_card(tx, sibling)?;
            }
            Ok(())
        })?;
        let id = frame.card_before.id;
        // Drop the re-enqueued copy, if the undone answer added one.
        if self.queue.back() == Some(&id) {
            self.queue.pop_back();
        }
        self.queue.push_front(id);
        self.answered = self.answered.saturating_sub(1);
        Ok(id)
    }

    /// A strictly increasing review instant. Two answers within the same
    /// millisecond, or a clock stepping backwards, must not produce
    /// out-of-order log entries.
    fn next_instant(&mut self) -> Timestamp {
        let now = Timestamp::now().max(self.last_instant.plus_millis(1));
        self.last_instant = now;
        now
    }

    fn push_undo(&mut self, frame: UndoFrame) {
        if self.undo_stack.len() == UNDO_DEPTH {
            self.undo_stack.pop_front();
        }
        self.undo_stack.push_back(frame);
    }
}

/// Siblings eligible for burial: waiting cards only. A sibling already in
/// a learning step keeps its intraday due time.
fn to_bury(siblings: &[Card], now: Timestamp) -> Vec<Card> {
    siblings
        .iter()
        .filter(|c| {
            c.is_active(now.date())
                && matches!(c.queue, Queue::New | Queue::Review { .. })
        })
        .cloned()
        .collect()
}
