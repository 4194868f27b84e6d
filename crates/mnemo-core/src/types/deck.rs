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

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use serde::Deserialize;
use serde::Serialize;

use crate::types::ids::DeckId;
use crate::types::timestamp::Timestamp;

/// A named group of cards. Decks form a tree; parent chains must be
/// acyclic.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Deck {
    pub id: DeckId,
    pub name: String,
    pub parent: Option<DeckId>,
    /// How many new cards may be introduced per calendar day.
    pub new_per_day: u32,
    /// How many review-state cards may be shown per calendar day.
    pub reviews_per_day: u32,
    pub modified_at: Timestamp,
}

impl Deck {
    pub fn new(
        id: DeckId,
        name: impl Into<String>,
        new_per_day: u32,
        reviews_per_day: u32,
        created_at: Timestamp,
    ) -> Self {
        Deck {
            id,
            name: name.into(),
            parent: None,
            new_per_day,
            reviews_per_day,
            modified_at: created_at,
        }
    }
}

/// The deck ids covered by a scope: the selected deck and all of its
/// descendants, or every deck when no deck is selected.
pub fn expand_scope(decks: &BTreeMap<DeckId, Deck>, root: Option<DeckId>) -> BTreeSet<DeckId> {
    let root = match root {
        Some(root) => root,
        None => return decks.keys().copied().collect(),
    };
    let mut scope: BTreeSet<DeckId> = BTreeSet::new();
    scope.insert(root);
    // Decks form a shallow tree; a fixpoint pass is simpler than building
    // a child index and terminates even on corrupt (cyclic) input.
    loop {
        let before = scope.len();
        for deck in decks.values() {
            if let Some(parent) = deck.parent {
                if scope.contains(&parent) {
                    scope.insert(deck.id);
                }
            }
        }
        if scope.len() == before {
            return scope;
        }
    }
}

/// Check that no deck's parent chain loops back on itself.
pub fn parents_acyclic(decks: &BTreeMap<DeckId, Deck>) -> bool {
    for deck in decks.values() {
        let mut seen: BTreeSet<DeckId> = BTreeSet::new();
        let mut cursor = Some(deck.id);
        while let Some(id) = cursor {
            if !seen.insert(id) {
                return false;
            }
            cursor = decks.get(&id).and_then(|d| d.parent);
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree() -> BTreeMap<DeckId, Deck> {
        let at = Timestamp::from_unix_millis(0);
        let mut decks = BTreeMap::new();
        let root = Deck::new(DeckId::new(1), "Languages", 20, 200, at);
        let mut child = Deck::new(DeckId::new(2), "Languages::French", 20, 200, at);
        child.parent = Some(DeckId::new(1));
        let mut grandchild = Deck::new(DeckId::new(3), "Languages::French::Verbs", 20, 200, at);
        grandchild.parent = Some(DeckId::new(2));
        let other = Deck::new(DeckId::new(4), "Geography", 20, 200, at);
        for deck in [root, child, grandchild, other] {
            decks.insert(deck.id, deck);
        }
        decks
    }

    #[test]
    fn test_scope_includes_descendants() {
        let scope = expand_scope(&tree(), Some(DeckId::new(1)));
        assert_eq!(
            scope,
            [1, 2, 3].map(DeckId::new).into_iter().collect::<BTreeSet<_>>()
        );
    }

    #[test]
    fn test_no_scope_covers_everything() {
        assert_eq!(expand_scope(&tree(), None).len(), 4);
    }

    #[test]
    fn test_acyclic_tree() {
        assert!(parents_acyclic(&tree()));
    }

    #[test]
    fn test_cycle_detected() {
        let mut decks = tree();
        decks.get_mut(&DeckId::new(1)).unwrap().parent = Some(DeckId::new(3));
        assert!(!parents_acyclic(&decks));
    }
}
