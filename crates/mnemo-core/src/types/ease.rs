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

/// The ease factor of a card, as a fixed-point permille value: 2500 means
/// the review interval grows by a factor of 2.50. Fixed-point arithmetic
/// keeps scheduling results identical across platforms.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ease(u32);

impl Ease {
    pub fn from_permille(permille: u32) -> Self {
        Self(permille)
    }

    pub fn permille(self) -> u32 {
        self.0
    }

    /// Lower the ease by `delta` permille, never dropping below `floor`.
    pub fn lowered(self, delta: u32, floor: Ease) -> Self {
        Self(self.0.saturating_sub(delta).max(floor.0))
    }

    /// Raise the ease by `delta` permille.
    pub fn raised(self, delta: u32) -> Self {
        Self(self.0 + delta)
    }
}

impl Display for Ease {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{:02}", self.0 / 1000, (self.0 % 1000) / 10)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lowered_respects_floor() {
        let floor = Ease::from_permille(1300);
        let ease = Ease::from_permille(1400);
        assert_eq!(ease.lowered(200, floor), floor);
        assert_eq!(ease.lowered(50, floor), Ease::from_permille(1350));
    }

    #[test]
    fn test_display() {
        assert_eq!(Ease::from_permille(2500).to_string(), "2.50");
        assert_eq!(Ease::from_permille(1300).to_string(), "1.30");
    }
}
