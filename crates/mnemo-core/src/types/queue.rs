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

use std::fmt::Display;
use std::fmt::Formatter;

use serde::Deserialize;
use serde::Serialize;

use crate::error::SchedulerError;
use crate::types::date::Date;
use crate::types::timestamp::Timestamp;

/// The scheduling state of a card. The due value is part of the variant:
/// short-term states are due at an instant, the long-term state is due on
/// a date, and a combination of the two cannot be represented.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Queue {
    /// Never reviewed.
    New,
    /// Working through the learning steps.
    Learning { step: u32, due_at: Timestamp },
    /// Graduated; reviewed at day granularity.
    Review { due_on: Date },
    /// Lapsed out of review; working through the relearning steps.
    Relearning { step: u32, due_at: Timestamp },
}

impl Queue {
    pub fn kind(&self) -> StateKind {
        match self {
            Queue::New => StateKind::New,
            Queue::Learning { .. } => StateKind::Learning,
            Queue::Review { .. } => StateKind::Review,
            Queue::Relearning { .. } => StateKind::Relearning,
        }
    }

    /// Whether the card is due at the given instant. New cards are always
    /// eligible; daily limits are applied separately at queue-build time.
    pub fn is_due(&self, now: Timestamp) -> bool {
        match self {
            Queue::New => true,
            Queue::Learning { due_at, .. } | Queue::Relearning { due_at, .. } => *due_at <= now,
            Queue::Review { due_on } => *due_on <= now.date(),
        }
    }
}

/// The state discriminant alone, recorded in the review log.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StateKind {
    New,
    Learning,
    Review,
    Relearning,
}

impl StateKind {
    pub fn as_str(&self) -> &str {
        match self {
            StateKind::New => "new",
            StateKind::Learning => "learning",
            StateKind::Review => "review",
            StateKind::Relearning => "relearning",
        }
    }
}

impl Display for StateKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<&str> for StateKind {
    type Error = SchedulerError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "new" => Ok(StateKind::New),
            "learning" => Ok(StateKind::Learning),
            "review" => Ok(StateKind::Review),
            "relearning" => Ok(StateKind::Relearning),
            _ => Err(SchedulerError::InvalidState(format!(
                "unknown state kind: {value}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_learning_due_at_instant() {
        let queue = Queue::Learning {
            step: 0,
            due_at: Timestamp::from_unix_millis(1_000),
        };
        assert!(!queue.is_due(Timestamp::from_unix_millis(999)));
        assert!(queue.is_due(Timestamp::from_unix_millis(1_000)));
    }

    #[test]
    fn test_review_due_on_date() {
        let queue = Queue::Review {
            due_on: Date::from_unix_days(3),
        };
        let end_of_day_2 = Timestamp::from_unix_millis(3 * 86_400_000 - 1);
        let start_of_day_3 = Timestamp::from_unix_millis(3 * 86_400_000);
        assert!(!queue.is_due(end_of_day_2));
        assert!(queue.is_due(start_of_day_3));
    }

    #[test]
    fn test_new_always_eligible() {
        assert!(Queue::New.is_due(Timestamp::from_unix_millis(0)));
    }

    #[test]
    fn test_serialized_form_is_tagged() {
        let queue = Queue::Review {
            due_on: Date::from_unix_days(0),
        };
        let json = serde_json::to_string(&queue).unwrap();
        assert_eq!(json, r#"{"kind":"review","due_on":"1970-01-01"}"#);
    }
}
