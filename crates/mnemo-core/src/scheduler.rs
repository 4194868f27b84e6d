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

//! The scheduling state machine.
//!
//! `answer` is a pure function of the card, the grade, the clock, the
//! configured parameters, and (when fuzz is enabled) a caller-supplied
//! seed. It holds no state of its own; the same inputs always produce
//! the same transition.

use crate::error::SchedulerError;
use crate::params::SchedulerParams;
use crate::rng::TinyRng;
use crate::types::card::Card;
use crate::types::grade::Grade;
use crate::types::queue::Queue;
use crate::types::queue::StateKind;
use crate::types::timestamp::Timestamp;

/// Fallback learning step when none are configured, in minutes.
const DEFAULT_STEP_MINS: u32 = 1;

/// The outcome of answering a card: the updated card plus the prior
/// values the review log records.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Answered {
    pub card: Card,
    pub state_before: StateKind,
    pub interval_before: u32,
}

/// Compute the card's next state after a grade.
///
/// Fails with `InvalidState` if the card is suspended; suspension must be
/// cleared explicitly before the card can transition again.
pub fn answer(
    card: &Card,
    grade: Grade,
    now: Timestamp,
    params: &SchedulerParams,
    fuzz_seed: u64,
) -> Result<Answered, SchedulerError> {
    if card.suspended {
        return Err(SchedulerError::InvalidState(format!(
            "card {} is suspended and cannot be answered",
            card.id
        )));
    }
    let state_before = card.queue.kind();
    let interval_before = card.interval_days;

    let mut next = card.clone();
    match card.queue {
        Queue::New => {
            // First review: the card enters learning at the first step,
            // whatever the grade.
            enter_step(&mut next, &params.learning_steps_mins, 0, now);
        }
        Queue::Learning { step, .. } => {
            step_answer(&mut next, grade, step, false, now, params);
        }
        Queue::Relearning { step, .. } => {
            step_answer(&mut next, grade, step, true, now, params);
        }
        Queue::Review { .. } => {
            review_answer(&mut next, grade, now, params, fuzz_seed);
        }
    }

    // Answering always clears burial and bumps the modification time.
    next.buried_until = None;
    next.modified_at = now;

    Ok(Answered {
        card: next,
        state_before,
        interval_before,
    })
}

/// Place the card on the given (re)learning step.
fn enter_step(card: &mut Card, steps: &[u32], step: u32, now: Timestamp) {
    let minutes = steps
        .get(step as usize)
        .copied()
        .unwrap_or(DEFAULT_STEP_MINS);
    let due_at = now.plus_minutes(minutes);
    card.queue = match card.queue.kind() {
        StateKind::Relearning => Queue::Relearning { step, due_at },
        _ => Queue::Learning { step, due_at },
    };
}

/// Shared mechanics for the learning and relearning queues.
fn step_answer(
    card: &mut Card,
    grade: Grade,
    step: u32,
    relearning: bool,
    now: Timestamp,
    params: &SchedulerParams,
) {
    let steps = if relearning {
        &params.relearning_steps_mins
    } else {
        &params.learning_steps_mins
    };
    match grade {
        Grade::Again => enter_step(card, steps, 0, now),
        Grade::Hard => enter_step(card, steps, step, now),
        Grade::Good | Grade::Easy => {
            let next_step = step + 1;
            if (next_step as usize) < steps.len() {
                enter_step(card, steps, next_step, now);
            } else if relearning {
                // Return to review with the post-lapse interval; the ease
                // adjustment from the lapse is preserved.
                card.queue = Queue::Review {
                    due_on: now.date().plus_days(card.interval_days),
                };
            } else {
                graduate(card, grade, now, params);
            }
        }
    }
}

/// Move a card from learning into review.
fn graduate(card: &mut Card, grade: Grade, now: Timestamp, params: &SchedulerParams) {
    let interval = match grade {
        Grade::Easy => params.easy_interval_days,
        _ => params.graduating_interval_days,
    };
    let interval = interval.clamp(1, params.max_interval_days);
    card.interval_days = interval;
    card.queue = Queue::Review {
        due_on: now.date().plus_days(interval),
    };
}

/// Answer a review-state card.
fn review_answer(
    card: &mut Card,
    grade: Grade,
    now: Timestamp,
    params: &SchedulerParams,
    fuzz_seed: u64,
) {
    let prior = card.interval_days;
    let mut interval = match grade {
        Grade::Again => return lapse(card, now, params),
        Grade::Hard => {
            card.ease = card.ease.lowered(params.hard_ease_delta, params.minimum_ease);
            scale_permille(prior, params.hard_multiplier_permille).max(prior)
        }
        Grade::Good => scale_permille(prior, card.ease.permille()).max(prior + 1),
        Grade::Easy => {
            let boosted = scale_permille(
                scale_permille(prior, card.ease.permille()),
                params.easy_bonus_permille,
            );
            card.ease = card.ease.raised(params.easy_ease_delta);
            boosted.max(prior + 1)
        }
    };
    if params.fuzz {
        let magnitude = scale_permille(interval, params.fuzz_permille);
        let mut rng = TinyRng::from_seed(fuzz_seed);
        interval = (interval as i64 + rng.generate_offset(magnitude)).max(1) as u32;
    }
    let interval = interval.clamp(1, params.max_interval_days);
    card.interval_days = interval;
    card.queue = Queue::Review {
        due_on: now.date().plus_days(interval),
    };
}

/// An "again" answer in review: penalize the ease, count the lapse, and
/// reset the interval to the configured fraction of its prior value.
fn lapse(card: &mut Card, now: Timestamp, params: &SchedulerParams) {
    card.ease = card.ease.lowered(params.again_ease_delta, params.minimum_ease);
    card.lapses += 1;
    let reset = scale_permille(card.interval_days, params.lapse_interval_permille)
        .clamp(1, params.max_interval_days);
    card.interval_days = reset;
    if params.relearning_steps_mins.is_empty() {
        card.queue = Queue::Review {
            due_on: now.date().plus_days(reset),
        };
    } else {
        let minutes = params.relearning_steps_mins[0];
        card.queue = Queue::Relearning {
            step: 0,
            due_at: now.plus_minutes(minutes),
        };
    }
}

/// Multiply a day count by a permille factor, rounding half-up. All
/// interval arithmetic is integral to avoid floating-point drift.
fn scale_permille(days: u32, permille: u32) -> u32 {
    ((days as i64 * permille as i64 + 500) / 1000) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::date::Date;
    use crate::types::ease::Ease;
    use crate::types::ids::CardId;
    use crate::types::ids::DeckId;
    use crate::types::ids::NoteId;

    const NOON: i64 = 86_400_000 * 100 + 43_200_000;

    fn params() -> SchedulerParams {
        SchedulerParams::default()
    }

    fn new_card() -> Card {
        Card::new(
            CardId::new(1),
            NoteId::new(1),
            DeckId::new(1),
            params().starting_ease,
            Timestamp::from_unix_millis(0),
        )
    }

    fn review_card(interval: u32, ease_permille: u32) -> Card {
        let mut card = new_card();
        card.interval_days = interval;
        card.ease = Ease::from_permille(ease_permille);
        card.queue = Queue::Review {
            due_on: Date::from_unix_days(100),
        };
        card
    }

    fn now() -> Timestamp {
        Timestamp::from_unix_millis(NOON)
    }

    #[test]
    fn test_scale_permille_rounds_half_up() {
        assert_eq!(scale_permille(10, 2500), 25);
        assert_eq!(scale_permille(1, 2500), 3); // 2.5 rounds up
        assert_eq!(scale_permille(3, 1200), 4); // 3.6 rounds up
        assert_eq!(scale_permille(2, 1200), 2); // 2.4 rounds down
    }

    #[test]
    fn test_new_card_graduates_after_three_goods() {
        // Steps [1m, 10m]: New -> Learning(step 0) -> Learning(step 1)
        // -> Review at the graduating interval.
        let params = params();
        let card = new_card();

        let first = answer(&card, Grade::Good, now(), &params, 0).unwrap();
        assert_eq!(first.state_before, StateKind::New);
        assert_eq!(
            first.card.queue,
            Queue::Learning {
                step: 0,
                due_at: now().plus_minutes(1),
            }
        );

        let second = answer(&first.card, Grade::Good, now(), &params, 0).unwrap();
        assert_eq!(
            second.card.queue,
            Queue::Learning {
                step: 1,
                due_at: now().plus_minutes(10),
            }
        );

        let third = answer(&second.card, Grade::Good, now(), &params, 0).unwrap();
        assert_eq!(third.card.interval_days, params.graduating_interval_days);
        assert_eq!(
            third.card.queue,
            Queue::Review {
                due_on: now().date().plus_days(params.graduating_interval_days),
            }
        );
    }

    #[test]
    fn test_learning_again_restarts_first_step() {
        let params = params();
        let card = new_card();
        let advanced = answer(&card, Grade::Good, now(), &params, 0).unwrap();
        let advanced = answer(&advanced.card, Grade::Good, now(), &params, 0).unwrap();
        let restarted = answer(&advanced.card, Grade::Again, now(), &params, 0).unwrap();
        assert_eq!(
            restarted.card.queue,
            Queue::Learning {
                step: 0,
                due_at: now().plus_minutes(1),
            }
        );
    }

    #[test]
    fn test_learning_hard_repeats_current_step() {
        let params = params();
        let card = new_card();
        let step1 = answer(&card, Grade::Good, now(), &params, 0).unwrap();
        let step1 = answer(&step1.card, Grade::Good, now(), &params, 0).unwrap();
        let held = answer(&step1.card, Grade::Hard, now(), &params, 0).unwrap();
        assert_eq!(
            held.card.queue,
            Queue::Learning {
                step: 1,
                due_at: now().plus_minutes(10),
            }
        );
    }

    #[test]
    fn test_easy_graduation_gets_easy_interval() {
        let params = params();
        let card = new_card();
        let step1 = answer(&card, Grade::Good, now(), &params, 0).unwrap();
        let step2 = answer(&step1.card, Grade::Good, now(), &params, 0).unwrap();
        let graduated = answer(&step2.card, Grade::Easy, now(), &params, 0).unwrap();
        assert_eq!(graduated.card.interval_days, params.easy_interval_days);
    }

    #[test]
    fn test_review_good_grows_interval() {
        let params = params();
        let card = review_card(10, 2500);
        let result = answer(&card, Grade::Good, now(), &params, 0).unwrap();
        assert_eq!(result.card.interval_days, 25);
        assert_eq!(result.interval_before, 10);
        assert_eq!(result.card.ease, Ease::from_permille(2500));
        assert_eq!(
            result.card.queue,
            Queue::Review {
                due_on: now().date().plus_days(25),
            }
        );
    }

    #[test]
    fn test_review_good_strictly_grows_even_at_floor_ease() {
        let params = params();
        let card = review_card(1, 1300);
        let result = answer(&card, Grade::Good, now(), &params, 0).unwrap();
        assert!(result.card.interval_days > 1);
        assert!(result.card.interval_days <= params.max_interval_days);
    }

    #[test]
    fn test_review_hard_lowers_ease_and_uses_hard_multiplier() {
        let params = params();
        let card = review_card(10, 2500);
        let result = answer(&card, Grade::Hard, now(), &params, 0).unwrap();
        assert_eq!(result.card.interval_days, 12);
        assert_eq!(result.card.ease, Ease::from_permille(2350));
    }

    #[test]
    fn test_review_easy_boosts_interval_and_ease() {
        let params = params();
        let card = review_card(10, 2500);
        let result = answer(&card, Grade::Easy, now(), &params, 0).unwrap();
        // 10 * 2.5 = 25, * 1.3 = 32.5, rounds up.
        assert_eq!(result.card.interval_days, 33);
        assert_eq!(result.card.ease, Ease::from_permille(2650));
    }

    #[test]
    fn test_interval_clamped_to_maximum() {
        let mut params = params();
        params.max_interval_days = 30;
        let card = review_card(20, 2500);
        let result = answer(&card, Grade::Good, now(), &params, 0).unwrap();
        assert_eq!(result.card.interval_days, 30);
    }

    #[test]
    fn test_lapse_penalizes_ease_and_enters_relearning() {
        // Review card with interval=10, ease=2.0 answered "again".
        let params = params();
        let card = review_card(10, 2000);
        let result = answer(&card, Grade::Again, now(), &params, 0).unwrap();
        assert_eq!(result.card.ease, Ease::from_permille(1800));
        assert_eq!(result.card.lapses, 1);
        // Default lapse fraction is zero, clamped up to one day.
        assert_eq!(result.card.interval_days, 1);
        assert_eq!(
            result.card.queue,
            Queue::Relearning {
                step: 0,
                due_at: now().plus_minutes(10),
            }
        );
    }

    #[test]
    fn test_lapse_keeps_configured_fraction() {
        let mut params = params();
        params.lapse_interval_permille = 500;
        let card = review_card(10, 2000);
        let result = answer(&card, Grade::Again, now(), &params, 0).unwrap();
        assert_eq!(result.card.interval_days, 5);
    }

    #[test]
    fn test_lapse_without_relearning_steps_stays_in_review() {
        let mut params = params();
        params.relearning_steps_mins = vec![];
        let card = review_card(10, 2000);
        let result = answer(&card, Grade::Again, now(), &params, 0).unwrap();
        assert_eq!(
            result.card.queue,
            Queue::Review {
                due_on: now().date().plus_days(1),
            }
        );
    }

    #[test]
    fn test_ease_never_drops_below_floor() {
        let params = params();
        let mut card = review_card(10, 1400);
        for _ in 0..5 {
            let result = answer(&card, Grade::Again, now(), &params, 0).unwrap();
            card = result.card;
            assert!(card.ease >= params.minimum_ease);
            // Lapsing puts the card into relearning; pull it back into
            // review to lapse it again.
            card.queue = Queue::Review {
                due_on: now().date(),
            };
        }
        assert_eq!(card.ease, params.minimum_ease);
        assert_eq!(card.lapses, 5);
    }

    #[test]
    fn test_relearning_graduation_preserves_lapsed_ease() {
        let mut params = params();
        params.lapse_interval_permille = 500;
        let card = review_card(10, 2000);
        let lapsed = answer(&card, Grade::Again, now(), &params, 0).unwrap();
        let graduated = answer(&lapsed.card, Grade::Good, now(), &params, 0).unwrap();
        assert_eq!(graduated.card.ease, Ease::from_permille(1800));
        assert_eq!(graduated.card.interval_days, 5);
        assert_eq!(
            graduated.card.queue,
            Queue::Review {
                due_on: now().date().plus_days(5),
            }
        );
    }

    #[test]
    fn test_fuzz_is_deterministic_and_bounded() {
        let mut params = params();
        params.fuzz = true;
        params.fuzz_permille = 100;
        let card = review_card(100, 2500);
        let a = answer(&card, Grade::Good, now(), &params, 42).unwrap();
        let b = answer(&card, Grade::Good, now(), &params, 42).unwrap();
        assert_eq!(a, b);
        // Unfuzzed interval is 250; magnitude is 25.
        assert!((225..=275).contains(&a.card.interval_days));
    }

    #[test]
    fn test_fuzz_disabled_ignores_seed() {
        let params = params();
        let card = review_card(10, 2500);
        let a = answer(&card, Grade::Good, now(), &params, 1).unwrap();
        let b = answer(&card, Grade::Good, now(), &params, 2).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_suspended_card_is_invalid_state() {
        let mut card = review_card(10, 2500);
        card.suspended = true;
        let result = answer(&card, Grade::Good, now(), &params(), 0);
        assert!(matches!(result, Err(SchedulerError::InvalidState(_))));
    }

    #[test]
    fn test_answering_clears_burial() {
        let params = params();
        let mut card = review_card(10, 2500);
        card.bury(now().date(), now());
        let result = answer(&card, Grade::Good, now(), &params, 0).unwrap();
        assert_eq!(result.card.buried_until, None);
    }
}
