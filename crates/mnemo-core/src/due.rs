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

//! Due-queue construction.
//!
//! Ordering: learning-state cards due now, then review-state cards due
//! today, then new cards. Within each class ties break by due value and
//! then card id, so the queue is deterministic and rebuilding it without
//! an intervening commit returns the same sequence.

use std::collections::BTreeMap;

use crate::types::card::Card;
use crate::types::date::Date;
use crate::types::deck::Deck;
use crate::types::deck::expand_scope;
use crate::types::ids::CardId;
use crate::types::ids::DeckId;
use crate::types::queue::Queue;
use crate::types::timestamp::Timestamp;

/// How many cards a deck has already consumed today, derived from the
/// day's review log entries.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DayCounts {
    /// Reviews logged today whose prior state was new.
    pub new_taken: u32,
    /// Reviews logged today whose prior state was review.
    pub reviews_taken: u32,
}

/// Build the ordered due queue for a deck scope.
///
/// Per-deck daily limits are enforced here, not by the caller: each
/// deck's remaining quota is its configured limit minus what today's
/// review log already records.
pub fn build_queue(
    cards: &[Card],
    decks: &BTreeMap<DeckId, Deck>,
    scope: Option<DeckId>,
    counts: &BTreeMap<DeckId, DayCounts>,
    now: Timestamp,
) -> Vec<CardId> {
    let today = now.date();
    let scope = expand_scope(decks, scope);

    let mut new_quota: BTreeMap<DeckId, u32> = BTreeMap::new();
    let mut review_quota: BTreeMap<DeckId, u32> = BTreeMap::new();
    for deck in decks.values() {
        let taken = counts.get(&deck.id).copied().unwrap_or_default();
        new_quota.insert(deck.id, deck.new_per_day.saturating_sub(taken.new_taken));
        review_quota.insert(
            deck.id,
            deck.reviews_per_day.saturating_sub(taken.reviews_taken),
        );
    }

    let mut learning: Vec<(Timestamp, CardId)> = Vec::new();
    let mut review: Vec<(Date, DeckId, CardId)> = Vec::new();
    let mut new: Vec<(DeckId, CardId)> = Vec::new();
    for card in cards {
        if !scope.contains(&card.deck_id) || !card.is_active(today) {
            continue;
        }
        match card.queue {
            Queue::Learning { due_at, .. } | Queue::Relearning { due_at, .. } => {
                if due_at <= now {
                    learning.push((due_at, card.id));
                }
            }
            Queue::Review { due_on } => {
                if due_on <= today {
                    review.push((due_on, card.deck_id, card.id));
                }
            }
            Queue::New => new.push((card.deck_id, card.id)),
        }
    }

    learning.sort();
    review.sort_by_key(|&(due_on, _, id)| (due_on, id));
    new.sort_by_key(|&(_, id)| id);

    let mut queue: Vec<CardId> = learning.into_iter().map(|(_, id)| id).collect();
    for (_, deck_id, id) in review {
        let quota = review_quota.entry(deck_id).or_default();
        if *quota > 0 {
            *quota -= 1;
            queue.push(id);
        }
    }
    for (deck_id, id) in new {
        let quota = new_quota.entry(deck_id).or_default();
        if *quota > 0 {
            *quota -= 1;
            queue.push(id);
        }
    }
    queue
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::date::Date;
    use crate::types::ease::Ease;
    use crate::types::ids::NoteId;

    const DAY: i64 = 86_400_000;

    fn deck(id: i64, new_per_day: u32, reviews_per_day: u32) -> Deck {
        Deck::new(
            DeckId::new(id),
            format!("deck-{id}"),
            new_per_day,
            reviews_per_day,
            Timestamp::from_unix_millis(0),
        )
    }

    fn card(id: i64, deck: i64, queue: Queue) -> Card {
        let mut card = Card::new(
            CardId::new(id),
            NoteId::new(id),
            DeckId::new(deck),
            Ease::from_permille(2500),
            Timestamp::from_unix_millis(0),
        );
        card.queue = queue;
        card
    }

    fn now() -> Timestamp {
        Timestamp::from_unix_millis(10 * DAY)
    }

    fn one_deck() -> BTreeMap<DeckId, Deck> {
        let mut decks = BTreeMap::new();
        decks.insert(DeckId::new(1), deck(1, 20, 200));
        decks
    }

    #[test]
    fn test_ordering_learning_review_new() {
        let cards = vec![
            card(1, 1, Queue::New),
            card(
                2,
                1,
                Queue::Review {
                    due_on: Date::from_unix_days(10),
                },
            ),
            card(
                3,
                1,
                Queue::Learning {
                    step: 0,
                    due_at: Timestamp::from_unix_millis(10 * DAY - 1),
                },
            ),
        ];
        let queue = build_queue(&cards, &one_deck(), None, &BTreeMap::new(), now());
        assert_eq!(queue, vec![CardId::new(3), CardId::new(2), CardId::new(1)]);
    }

    #[test]
    fn test_ties_break_by_due_then_id() {
        let due_on = Date::from_unix_days(9);
        let earlier = Date::from_unix_days(8);
        let cards = vec![
            card(5, 1, Queue::Review { due_on }),
            card(2, 1, Queue::Review { due_on }),
            card(9, 1, Queue::Review { due_on: earlier }),
        ];
        let queue = build_queue(&cards, &one_deck(), None, &BTreeMap::new(), now());
        assert_eq!(queue, vec![CardId::new(9), CardId::new(2), CardId::new(5)]);
    }

    #[test]
    fn test_not_yet_due_excluded() {
        let cards = vec![
            card(
                1,
                1,
                Queue::Review {
                    due_on: Date::from_unix_days(11),
                },
            ),
            card(
                2,
                1,
                Queue::Learning {
                    step: 0,
                    due_at: Timestamp::from_unix_millis(10 * DAY + 1),
                },
            ),
        ];
        let queue = build_queue(&cards, &one_deck(), None, &BTreeMap::new(), now());
        assert!(queue.is_empty());
    }

    #[test]
    fn test_suspended_and_buried_excluded() {
        let mut suspended = card(1, 1, Queue::New);
        suspended.suspended = true;
        let mut buried = card(2, 1, Queue::New);
        buried.buried_until = Some(Date::from_unix_days(11));
        let queue = build_queue(
            &[suspended, buried],
            &one_deck(),
            None,
            &BTreeMap::new(),
            now(),
        );
        assert!(queue.is_empty());
    }

    #[test]
    fn test_daily_limits_account_for_todays_log() {
        let mut decks = BTreeMap::new();
        decks.insert(DeckId::new(1), deck(1, 2, 1));
        let cards = vec![
            card(1, 1, Queue::New),
            card(2, 1, Queue::New),
            card(3, 1, Queue::New),
            card(
                4,
                1,
                Queue::Review {
                    due_on: Date::from_unix_days(10),
                },
            ),
        ];

        // Fresh day: two new cards and the review fit.
        let queue = build_queue(&cards, &decks, None, &BTreeMap::new(), now());
        assert_eq!(
            queue,
            vec![CardId::new(4), CardId::new(1), CardId::new(2)]
        );

        // One new card and one review already taken today.
        let mut counts = BTreeMap::new();
        counts.insert(
            DeckId::new(1),
            DayCounts {
                new_taken: 1,
                reviews_taken: 1,
            },
        );
        let queue = build_queue(&cards, &decks, None, &counts, now());
        assert_eq!(queue, vec![CardId::new(1)]);
    }

    #[test]
    fn test_scope_covers_subtree_only() {
        let mut decks = BTreeMap::new();
        decks.insert(DeckId::new(1), deck(1, 20, 200));
        let mut child = deck(2, 20, 200);
        child.parent = Some(DeckId::new(1));
        decks.insert(DeckId::new(2), child);
        decks.insert(DeckId::new(3), deck(3, 20, 200));
        let cards = vec![
            card(1, 1, Queue::New),
            card(2, 2, Queue::New),
            card(3, 3, Queue::New),
        ];
        let queue = build_queue(&cards, &decks, Some(DeckId::new(1)), &BTreeMap::new(), now());
        assert_eq!(queue, vec![CardId::new(1), CardId::new(2)]);
    }

    #[test]
    fn test_rebuild_is_idempotent() {
        let cards = vec![
            card(1, 1, Queue::New),
            card(
                2,
                1,
                Queue::Review {
                    due_on: Date::from_unix_days(10),
                },
            ),
        ];
        let decks = one_deck();
        let first = build_queue(&cards, &decks, None, &BTreeMap::new(), now());
        let second = build_queue(&cards, &decks, None, &BTreeMap::new(), now());
        assert_eq!(first, second);
    }
}
