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

use crate::types::date::Date;
use crate::types::ease::Ease;
use crate::types::ids::CardId;
use crate::types::ids::DeckId;
use crate::types::ids::NoteId;
use crate::types::queue::Queue;
use crate::types::timestamp::Timestamp;

/// One reviewable facet of a note, belonging to exactly one deck.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Card {
    pub id: CardId,
    pub note_id: NoteId,
    pub deck_id: DeckId,
    pub queue: Queue,
    /// The current review interval in days. Zero until the card first
    /// graduates; during relearning it holds the post-lapse interval the
    /// card will return to.
    pub interval_days: u32,
    pub ease: Ease,
    /// How many times the card has lapsed out of review.
    pub lapses: u32,
    /// Manually suspended. Excluded from due computation until cleared.
    pub suspended: bool,
    /// Buried until the given date, e.g. because a sibling was answered.
    pub buried_until: Option<Date>,
    pub modified_at: Timestamp,
}

impl Card {
    /// A brand-new card in the given deck.
    pub fn new(
        id: CardId,
        note_id: NoteId,
        deck_id: DeckId,
        starting_ease: Ease,
        created_at: Timestamp,
    ) -> Self {
        Card {
            id,
            note_id,
            deck_id,
            queue: Queue::New,
            interval_days: 0,
            ease: starting_ease,
            lapses: 0,
            suspended: false,
            buried_until: None,
            modified_at: created_at,
        }
    }

    /// Whether the card can appear in the due queue at all: not suspended
    /// and not buried as of `today`.
    pub fn is_active(&self, today: Date) -> bool {
        if self.suspended {
            return false;
        }
        match self.buried_until {
            Some(until) => today >= until,
            None => true,
        }
    }

    /// Bury the card until the day after `today`.
    pub fn bury(&mut self, today: Date, now: Timestamp) {
        self.buried_until = Some(today.plus_days(1));
        self.modified_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card() -> Card {
        Card::new(
            CardId::new(1),
            NoteId::new(1),
            DeckId::new(1),
            Ease::from_permille(2500),
            Timestamp::from_unix_millis(0),
        )
    }

    #[test]
    fn test_new_card_is_active() {
        assert!(card().is_active(Date::from_unix_days(0)));
    }

    #[test]
    fn test_suspended_card_is_inactive() {
        let mut card = card();
        card.suspended = true;
        assert!(!card.is_active(Date::from_unix_days(0)));
    }

    #[test]
    fn test_burial_expires_next_day() {
        let mut card = card();
        let today = Date::from_unix_days(10);
        card.bury(today, Timestamp::from_unix_millis(0));
        assert!(!card.is_active(today));
        assert!(card.is_active(today.plus_days(1)));
    }
}
