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

use crate::types::ease::Ease;

/// The scheduler's policy constants. Stored in the collection metadata
/// and passed explicitly into every scheduling computation, so that a
/// test suite can pin them down exactly.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerParams {
    /// Learning steps for new cards, in minutes.
    pub learning_steps_mins: Vec<u32>,
    /// Relearning steps after a lapse, in minutes. Empty means a lapsed
    /// card goes straight back to review.
    pub relearning_steps_mins: Vec<u32>,
    /// Interval granted when a card graduates from learning, in days.
    pub graduating_interval_days: u32,
    /// Interval granted when "easy" skips the remaining learning steps.
    pub easy_interval_days: u32,
    pub starting_ease: Ease,
    /// Floor below which the ease factor never drops.
    pub minimum_ease: Ease,
    /// Ease penalty for a lapse, in permille.
    pub again_ease_delta: u32,
    /// Ease penalty for "hard", in permille.
    pub hard_ease_delta: u32,
    /// Ease bonus for "easy", in permille.
    pub easy_ease_delta: u32,
    /// Interval multiplier for "hard", in permille of the prior interval.
    pub hard_multiplier_permille: u32,
    /// Extra interval multiplier for "easy", in permille.
    pub easy_bonus_permille: u32,
    /// Fraction of the prior interval a lapsed card keeps, in permille.
    pub lapse_interval_permille: u32,
    pub max_interval_days: u32,
    /// Whether to perturb computed intervals to avoid due-date clustering.
    pub fuzz: bool,
    /// Maximum fuzz magnitude, in permille of the computed interval.
    pub fuzz_permille: u32,
    /// Default per-day limits for decks that do not set their own.
    pub new_per_day: u32,
    pub reviews_per_day: u32,
}

impl Default for SchedulerParams {
    fn default() -> Self {
        SchedulerParams {
            learning_steps_mins: vec![1, 10],
            relearning_steps_mins: vec![10],
            graduating_interval_days: 1,
            easy_interval_days: 4,
            starting_ease: Ease::from_permille(2500),
            minimum_ease: Ease::from_permille(1300),
            again_ease_delta: 200,
            hard_ease_delta: 150,
            easy_ease_delta: 150,
            hard_multiplier_permille: 1200,
            easy_bonus_permille: 1300,
            lapse_interval_permille: 0,
            max_interval_days: 36_500,
            fuzz: false,
            fuzz_permille: 50,
            new_per_day: 20,
            reviews_per_day: 200,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_keys_fall_back_to_defaults() {
        let params: SchedulerParams = serde_json::from_str(r#"{"fuzz":true}"#).unwrap();
        assert!(params.fuzz);
        assert_eq!(params.learning_steps_mins, vec![1, 10]);
    }
}
